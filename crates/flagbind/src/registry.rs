//! Declarative binding table.
//!
//! A target type lists its annotated fields once, in [`Flags::register`](crate::Flags::register),
//! pairing a [`FieldMeta`] with a mutable reference to the field. The engine
//! rebuilds this table on every call and drives the fields through it.

use crate::value::{FlagValue, Kind, ValueError};

/// Split a comma-separated alias list, trimming each alias and dropping empty ones.
pub fn split_aliases(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|alias| !alias.is_empty())
}

/// Annotations of one bound field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMeta {
    name: String,
    aliases: Vec<String>,
    env: Option<String>,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add flag aliases from a comma-separated list such as `"s, string"`.
    ///
    /// The first alias ever added becomes the canonical name.
    pub fn flags(mut self, list: &str) -> Self {
        self.aliases.extend(split_aliases(list).map(str::to_owned));
        self
    }

    /// Set the environment variable suffix (the prefix is added by the parser).
    pub fn env(mut self, var: impl Into<String>) -> Self {
        let var = var.into();
        let var = var.trim();
        if !var.is_empty() {
            self.env = Some(var.to_owned());
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn canonical(&self) -> Option<&str> {
        self.aliases.first().map(String::as_str)
    }

    pub fn env_var(&self) -> Option<&str> {
        self.env.as_deref()
    }
}

/// Accepts textual values for one bound field.
pub(crate) trait Acceptor {
    fn kind(&self) -> Kind;

    fn set(&mut self, raw: &str) -> Result<(), ValueError>;

    /// Set from an environment variable. Repeatable fields take a
    /// comma-separated list that replaces their contents.
    fn set_from_env(&mut self, raw: &str) -> Result<(), ValueError> {
        self.set(raw)
    }

    fn render(&self) -> String;
}

struct Scalar<'a, T> {
    slot: &'a mut T,
}

impl<T: FlagValue> Acceptor for Scalar<'_, T> {
    fn kind(&self) -> Kind {
        T::KIND
    }

    fn set(&mut self, raw: &str) -> Result<(), ValueError> {
        *self.slot = T::parse_value(raw)?;
        Ok(())
    }

    fn render(&self) -> String {
        self.slot.render()
    }
}

struct Repeated<'a, T> {
    slot: &'a mut Vec<T>,
}

impl<T: FlagValue> Acceptor for Repeated<'_, T> {
    fn kind(&self) -> Kind {
        T::KIND
    }

    fn set(&mut self, raw: &str) -> Result<(), ValueError> {
        self.slot.push(T::parse_value(raw)?);
        Ok(())
    }

    fn set_from_env(&mut self, raw: &str) -> Result<(), ValueError> {
        let values = raw
            .split(',')
            .map(T::parse_value)
            .collect::<Result<Vec<_>, _>>()?;
        *self.slot = values;
        Ok(())
    }

    fn render(&self) -> String {
        let items: Vec<String> = self.slot.iter().map(FlagValue::render).collect();
        format!("[{}]", items.join(", "))
    }
}

/// One registered field.
pub(crate) struct Binding<'a> {
    pub(crate) meta: FieldMeta,
    pub(crate) acceptor: Box<dyn Acceptor + 'a>,
    pub(crate) repeated: bool,
}

/// Collects the field bindings of one target value.
#[derive(Default)]
pub struct Registry<'a> {
    bindings: Vec<Binding<'a>>,
}

impl<'a> Registry<'a> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Bind a single-valued field; a repeated flag overwrites it.
    pub fn scalar<T: FlagValue + 'a>(&mut self, meta: FieldMeta, slot: &'a mut T) -> &mut Self {
        self.bindings.push(Binding {
            meta,
            acceptor: Box::new(Scalar { slot }),
            repeated: false,
        });
        self
    }

    /// Bind a repeatable field; every occurrence of the flag appends one element.
    pub fn repeated<T: FlagValue + 'a>(&mut self, meta: FieldMeta, slot: &'a mut Vec<T>) -> &mut Self {
        self.bindings.push(Binding {
            meta,
            acceptor: Box::new(Repeated { slot }),
            repeated: true,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub(crate) fn into_bindings(self) -> Vec<Binding<'a>> {
        self.bindings
    }
}
