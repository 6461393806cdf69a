use super::reflection::ReflectionList;

/// The contribution of one phase to a calculated pattern.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhaseContribution {
    pub label: String,
    /// Phase scale `s_i` applied to [`profile`](Self::profile).
    pub scale: f64,
    /// Scaled profile `s_i · p_i` on the evaluation grid.
    pub profile: Vec<f64>,
    pub reflections: ReflectionList,
}

/// The normalized output of a calculation.
///
/// `total[j] = global_scale · Σ_i phases[i].profile[j] + background[j]` holds for every
/// grid point; [`CalcResult::assemble`] is the only constructor that computes `total`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalcResult {
    /// The caller's grid, before any zero shift.
    pub x: Vec<f64>,
    pub total: Vec<f64>,
    /// Contributions in phase registration order.
    pub phases: Vec<PhaseContribution>,
    pub background: Vec<f64>,
    pub global_scale: f64,
}

impl CalcResult {
    pub fn assemble(
        x: Vec<f64>,
        background: Vec<f64>,
        phases: Vec<PhaseContribution>,
        global_scale: f64,
    ) -> Self {
        let mut total = vec![0.0; x.len()];
        for phase in &phases {
            for (t, p) in total.iter_mut().zip(&phase.profile) {
                *t += p;
            }
        }
        for (t, b) in total.iter_mut().zip(&background) {
            *t = global_scale * *t + b;
        }
        Self {
            x,
            total,
            phases,
            background,
            global_scale,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn phase(&self, label: &str) -> Option<&PhaseContribution> {
        self.phases.iter().find(|p| p.label == label)
    }

    /// Reflection lists keyed by phase label, in registration order.
    pub fn reflections(&self) -> impl Iterator<Item = (&str, &ReflectionList)> {
        self.phases
            .iter()
            .map(|p| (p.label.as_str(), &p.reflections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contribution(label: &str, profile: Vec<f64>) -> PhaseContribution {
        PhaseContribution {
            label: label.to_string(),
            scale: 1.0,
            profile,
            reflections: ReflectionList::default(),
        }
    }

    #[test]
    fn assemble_applies_global_scale_before_background() {
        let result = CalcResult::assemble(
            vec![1.0, 2.0],
            vec![10.0, 20.0],
            vec![
                contribution("a", vec![1.0, 2.0]),
                contribution("b", vec![3.0, 4.0]),
            ],
            0.5,
        );
        assert_eq!(result.total, vec![12.0, 23.0]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.phase("b").unwrap().profile, vec![3.0, 4.0]);
        let labels: Vec<&str> = result.reflections().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["a", "b"]);
    }

    #[test]
    fn assemble_without_phases_is_background() {
        let result = CalcResult::assemble(vec![1.0, 2.0, 3.0], vec![1.0; 3], Vec::new(), 1.0);
        assert_eq!(result.total, vec![1.0; 3]);
    }
}
