use std::borrow::Cow;

use smol_str::SmolStr;

use super::{Node, Value, child_path};

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Group(Group),
    Dataset(Value),
}

/// An in-memory group: attributes plus named child entries in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    attributes: Vec<(SmolStr, Value)>,
    entries: Vec<(SmolStr, Entry)>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_dataset(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, Entry::Dataset(value.into()));
        self
    }

    pub fn with_group(mut self, name: &str, group: Group) -> Self {
        self.insert(name, Entry::Group(group));
        self
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((SmolStr::new(name), value)),
        }
    }

    pub fn insert(&mut self, name: &str, entry: Entry) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, e)) => *e = entry,
            None => self.entries.push((SmolStr::new(name), entry)),
        }
    }

    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    /// Resolves a slash-separated path of nested groups.
    pub fn find(&self, path: &str) -> Option<&Group> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |group, name| match group.entry(name) {
                Some(Entry::Group(g)) => Some(g),
                _ => None,
            })
    }

    /// Views this group as a [`Node`] located at `path`.
    pub fn at(&self, path: impl Into<String>) -> GroupRef<'_> {
        GroupRef {
            group: self,
            path: path.into(),
        }
    }

    pub fn as_node(&self) -> GroupRef<'_> {
        self.at("/")
    }
}

/// A borrowed [`Group`] together with its location in the tree.
#[derive(Debug, Clone)]
pub struct GroupRef<'a> {
    group: &'a Group,
    path: String,
}

impl Node for GroupRef<'_> {
    fn path(&self) -> &str {
        &self.path
    }

    fn attribute(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.group
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| Cow::Borrowed(v))
    }

    fn dataset(&self, name: &str) -> Option<Cow<'_, Value>> {
        match self.group.entry(name) {
            Some(Entry::Dataset(v)) => Some(Cow::Borrowed(v)),
            _ => None,
        }
    }

    fn group(&self, name: &str) -> Option<Box<dyn Node + '_>> {
        match self.group.entry(name) {
            Some(Entry::Group(g)) => Some(Box::new(g.at(child_path(&self.path, name)))),
            _ => None,
        }
    }

    fn children(&self) -> Vec<SmolStr> {
        self.group.entries.iter().map(|(n, _)| n.clone()).collect()
    }
}
