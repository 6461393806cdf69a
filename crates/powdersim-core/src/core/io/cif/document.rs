use super::CifError;
use super::parser;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Lower-cases a tag and replaces DDLm category dots with underscores.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace('.', "_")
}

/// A parsed CIF document: an ordered list of data blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CifDocument {
    pub blocks: Vec<CifBlock>,
}

impl CifDocument {
    pub fn parse(text: &str) -> Result<Self, CifError> {
        parser::parse_document(text)
    }

    pub fn read_from(reader: &mut impl Read) -> Result<Self, CifError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self, CifError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CifError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn first_block(&self) -> Result<&CifBlock, CifError> {
        self.blocks.first().ok_or(CifError::NoDataBlock)
    }

    pub fn block(&self, name: &str) -> Option<&CifBlock> {
        self.blocks
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name))
    }
}

/// A `loop_` construct: a table with one column per tag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CifLoop {
    pub tags: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CifLoop {
    pub fn index_of(&self, tag: &str) -> Option<usize> {
        let tag = normalize_tag(tag);
        self.tags.iter().position(|t| *t == tag)
    }

    pub fn column(&self, tag: &str) -> Option<Vec<&str>> {
        let index = self.index_of(tag)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }
}

/// One `data_` block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CifBlock {
    pub name: String,
    pub items: Vec<(String, String)>,
    pub loops: Vec<CifLoop>,
}

impl CifBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The value of a single-valued item. A loop holding the tag is accepted when it
    /// has exactly one row.
    pub fn value(&self, tag: &str) -> Option<&str> {
        let tag = normalize_tag(tag);
        if let Some((_, value)) = self.items.iter().find(|(t, _)| *t == tag) {
            return Some(value.as_str());
        }
        self.loops.iter().find_map(|l| {
            let index = l.index_of(&tag)?;
            match l.rows.as_slice() {
                [row] => Some(row[index].as_str()),
                _ => None,
            }
        })
    }

    /// The first tag of `tags` that is present, with its value.
    pub fn first_value<'a>(&'a self, tags: &[&'a str]) -> Option<(&'a str, &'a str)> {
        tags.iter()
            .find_map(|&tag| self.value(tag).map(|value| (tag, value)))
    }

    /// All values of a looped tag. A single-valued item yields a one-element column.
    pub fn column(&self, tag: &str) -> Option<Vec<&str>> {
        let tag = normalize_tag(tag);
        if let Some(column) = self.loops.iter().find_map(|l| l.column(&tag)) {
            return Some(column);
        }
        self.items
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| vec![v.as_str()])
    }

    pub fn loop_with(&self, tag: &str) -> Option<&CifLoop> {
        let tag = normalize_tag(tag);
        self.loops.iter().find(|l| l.index_of(&tag).is_some())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.value(tag).is_some() || self.loop_with(tag).is_some()
    }

    pub fn insert(&mut self, tag: &str, value: impl Into<String>) {
        let tag = normalize_tag(tag);
        let value = value.into();
        match self.items.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, existing)) => *existing = value,
            None => self.items.push((tag, value)),
        }
    }
}
