//! Fully-qualified symbol names.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use smol_str::SmolStr;

/// A fully-qualified symbol name such as `\App\Http\Kernel` or
/// `\App\Http\Kernel::handle()`.
///
/// Cheap to clone (inline for short names, shared otherwise) and borrowable
/// as `&str`, so maps keyed by `Fqn` can be queried with plain strings.
#[derive(Clone, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Fqn(SmolStr);

impl Fqn {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(SmolStr::new(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for Fqn {
    type Target = str;

    fn deref(&self) -> &str {
        self.0.as_str()
    }
}

impl Borrow<str> for Fqn {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Fqn {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for Fqn {
    fn from(name: &str) -> Self {
        Self(SmolStr::new(name))
    }
}

impl From<String> for Fqn {
    fn from(name: String) -> Self {
        Self(SmolStr::from(name))
    }
}

impl From<SmolStr> for Fqn {
    fn from(name: SmolStr) -> Self {
        Self(name)
    }
}

impl PartialEq<str> for Fqn {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Fqn {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Debug for Fqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_str(), f)
    }
}

impl fmt::Display for Fqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// How fully-qualified names of the indexed language are put together.
///
/// The default matches PHP: namespaces are joined with `\`, and class members
/// hang off their class with `::` (static members, constants, methods) or `->`
/// (instance properties).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FqnSyntax {
    separator: SmolStr,
    member_operators: Vec<SmolStr>,
}

impl Default for FqnSyntax {
    fn default() -> Self {
        Self {
            separator: SmolStr::new_static("\\"),
            member_operators: vec![SmolStr::new_static("::"), SmolStr::new_static("->")],
        }
    }
}

impl FqnSyntax {
    /// A syntax with the given namespace separator and no member operators.
    pub fn new(separator: impl AsRef<str>) -> Self {
        Self {
            separator: SmolStr::new(separator),
            member_operators: Vec::new(),
        }
    }

    /// Add an operator that attaches a member to its owning type.
    pub fn with_member_operator(mut self, operator: impl AsRef<str>) -> Self {
        self.member_operators.push(SmolStr::new(operator));
        self
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// The namespace a definition is listed under.
    ///
    /// "\A\B\X" -> "\A\B"
    /// "\A\Foo::bar()" -> "\A\Foo" (members belong to their type)
    /// "X" -> ""
    pub fn namespace<'a>(&self, fqn: &'a str) -> &'a str {
        let member_split = self
            .member_operators
            .iter()
            .filter(|op| !op.is_empty())
            .filter_map(|op| fqn.find(op.as_str()))
            .min();
        if let Some(pos) = member_split {
            return &fqn[..pos];
        }
        if self.separator.is_empty() {
            return "";
        }
        match fqn.rfind(self.separator.as_str()) {
            Some(pos) => &fqn[..pos],
            None => "",
        }
    }

    /// The name with its namespace qualifier stripped.
    ///
    /// "\My\Namespace\Foo" -> "Foo"
    /// "Foo" -> "Foo"
    pub fn unqualified<'a>(&self, fqn: &'a str) -> &'a str {
        if self.separator.is_empty() {
            return fqn;
        }
        match fqn.rfind(self.separator.as_str()) {
            Some(pos) => &fqn[pos + self.separator.len()..],
            None => fqn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    #[test]
    fn test_fqn_lookup_by_str() {
        let mut map = FxHashMap::default();
        map.insert(Fqn::from("\\A\\Foo"), 1);

        assert_eq!(map.get("\\A\\Foo"), Some(&1));
        assert_eq!(map.get("\\A\\Bar"), None);
    }

    #[test]
    fn test_namespace_of_plain_names() {
        let syntax = FqnSyntax::default();

        assert_eq!(syntax.namespace("\\A\\B\\X"), "\\A\\B");
        assert_eq!(syntax.namespace("\\A\\B\\C\\Y"), "\\A\\B\\C");
        assert_eq!(syntax.namespace("\\strlen"), "");
        assert_eq!(syntax.namespace("strlen"), "");
    }

    #[test]
    fn test_namespace_of_members() {
        let syntax = FqnSyntax::default();

        assert_eq!(syntax.namespace("\\A\\Foo::bar()"), "\\A\\Foo");
        assert_eq!(syntax.namespace("\\A\\Foo->prop"), "\\A\\Foo");
        assert_eq!(syntax.namespace("\\A\\Foo::CONST"), "\\A\\Foo");
    }

    #[test]
    fn test_unqualified() {
        let syntax = FqnSyntax::default();

        assert_eq!(syntax.unqualified("\\My\\Namespace\\Foo"), "Foo");
        assert_eq!(syntax.unqualified("Foo"), "Foo");
        assert_eq!(syntax.unqualified("\\A\\Foo::bar()"), "Foo::bar()");
    }

    #[test]
    fn test_double_colon_separator() {
        let syntax = FqnSyntax::new("::");

        assert_eq!(syntax.namespace("Vehicle::Car::engine"), "Vehicle::Car");
        assert_eq!(syntax.unqualified("Vehicle::Car::engine"), "engine");
        assert_eq!(syntax.namespace("Vehicle"), "");
    }
}
