/// A single reflection as seen by callers iterating a [`ReflectionList`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflection {
    pub hkl: [i32; 3],
    /// Peak position on the calculation grid: 2θ in degrees (CW, zero shift removed),
    /// time of flight in µs (TOF) or d in Å.
    pub coord: f64,
    pub multiplicity: u32,
}

/// Reflections of one phase stored as parallel columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReflectionList {
    pub h: Vec<i32>,
    pub k: Vec<i32>,
    pub l: Vec<i32>,
    pub coord: Vec<f64>,
    pub multiplicity: Vec<u32>,
}

impl ReflectionList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            h: Vec::with_capacity(capacity),
            k: Vec::with_capacity(capacity),
            l: Vec::with_capacity(capacity),
            coord: Vec::with_capacity(capacity),
            multiplicity: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, reflection: Reflection) {
        let [h, k, l] = reflection.hkl;
        self.h.push(h);
        self.k.push(k);
        self.l.push(l);
        self.coord.push(reflection.coord);
        self.multiplicity.push(reflection.multiplicity);
    }

    pub fn len(&self) -> usize {
        self.h.len()
    }

    pub fn is_empty(&self) -> bool {
        self.h.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Reflection> {
        Some(Reflection {
            hkl: [
                *self.h.get(index)?,
                *self.k.get(index)?,
                *self.l.get(index)?,
            ],
            coord: *self.coord.get(index)?,
            multiplicity: *self.multiplicity.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Reflection> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// Reorders all columns by ascending coordinate.
    pub fn sort_by_coord(&mut self) {
        let mut rows: Vec<Reflection> = self.iter().collect();
        rows.sort_by(|a, b| a.coord.total_cmp(&b.coord));
        *self = rows.into_iter().collect();
    }
}

impl FromIterator<Reflection> for ReflectionList {
    fn from_iter<I: IntoIterator<Item = Reflection>>(iter: I) -> Self {
        let mut list = ReflectionList::default();
        for reflection in iter {
            list.push(reflection);
        }
        list
    }
}
