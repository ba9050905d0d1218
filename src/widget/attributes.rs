//! Resolved attribute tables, diffs and attribute groups.
//!
//! Attributes are stored flat under their full key (`text`, `pos:grid`,
//! `weight:x`). Keys containing `:` belong to the group named by their
//! first segment; [`ResolvedAttributes::group`] nests them back into maps
//! and the typed accessors ([`Position`], [`Weights`], event bindings)
//! interpret the well-known groups.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::traits::WidgetError;
use crate::value::Value;

pub const POSITION_GROUP: &str = "pos";
pub const BINDING_GROUP: &str = "bind";
pub const WEIGHT_GROUP: &str = "weight";

/// First segment of a grouped key, `None` for a plain key.
pub fn group_of(key: &str) -> Option<&str> {
    key.split_once(':').map(|(head, _)| head)
}

// ---------------------------------------------------------------------------
// ResolvedAttributes
// ---------------------------------------------------------------------------

/// The current values of a component's attributes, by full key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedAttributes {
    values: BTreeMap<String, Value>,
}

impl ResolvedAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Attributes whose key has no group.
    pub fn plain(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.iter().filter(|(k, _)| !k.contains(':'))
    }

    pub fn group_names(&self) -> BTreeSet<&str> {
        self.values.keys().filter_map(|k| group_of(k)).collect()
    }

    /// Keys of `name` nested into maps: `lay:w:x=1` becomes
    /// `{w: {x: 1}}` in group `lay`.
    pub fn group(&self, name: &str) -> Option<BTreeMap<String, Value>> {
        nest(name, self.iter())
    }

    pub fn position(&self) -> Result<Option<Position>, WidgetError> {
        match self.group(POSITION_GROUP) {
            Some(group) => Position::from_group(&group).map(Some),
            None => Ok(None),
        }
    }

    pub fn weights(&self) -> Result<Weights, WidgetError> {
        match self.group(WEIGHT_GROUP) {
            Some(group) => Weights::from_group(&group),
            None => Ok(Weights::default()),
        }
    }

    /// Event name → handler from the `bind` group.
    pub fn bindings(&self) -> BTreeMap<String, Value> {
        self.iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(BINDING_GROUP)
                    .and_then(|rest| rest.strip_prefix(':'))
                    .map(|event| (event.to_owned(), v.clone()))
            })
            .collect()
    }

    /// Keys whose value differs in `newer`. Keys missing from `newer` are
    /// reported as removed.
    pub fn diff(&self, newer: &ResolvedAttributes) -> AttributeChanges {
        let mut changes = AttributeChanges::default();
        for (key, value) in &newer.values {
            if self.values.get(key) != Some(value) {
                changes.changed.insert(key.clone(), value.clone());
            }
        }
        for key in self.values.keys() {
            if !newer.values.contains_key(key) {
                changes.removed.push(key.clone());
            }
        }
        let touched: BTreeSet<String> = changes
            .changed
            .keys()
            .chain(&changes.removed)
            .filter_map(|k| group_of(k))
            .map(str::to_owned)
            .collect();
        for name in touched {
            if let Some(group) = newer.group(&name) {
                changes.groups.insert(name, group);
            }
        }
        changes
    }
}

impl FromIterator<(String, Value)> for ResolvedAttributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ResolvedAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.values {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{k}={}", quoted(v))?;
        }
        Ok(())
    }
}

fn quoted(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

fn nest<'a>(
    name: &str,
    entries: impl Iterator<Item = (&'a str, &'a Value)>,
) -> Option<BTreeMap<String, Value>> {
    let mut root: BTreeMap<String, Value> = BTreeMap::new();
    let mut found = false;
    for (key, value) in entries {
        let Some(rest) = key.strip_prefix(name).and_then(|r| r.strip_prefix(':')) else {
            continue;
        };
        found = true;
        insert_nested(&mut root, rest, value.clone());
    }
    found.then_some(root)
}

fn insert_nested(map: &mut BTreeMap<String, Value>, path: &str, value: Value) {
    match path.split_once(':') {
        None => {
            map.insert(path.to_owned(), value);
        }
        Some((head, rest)) => {
            let slot = map
                .entry(head.to_owned())
                .or_insert_with(|| Value::Map(BTreeMap::new()));
            if !matches!(slot, Value::Map(_)) {
                *slot = Value::Map(BTreeMap::new());
            }
            if let Value::Map(inner) = slot {
                insert_nested(inner, rest, value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// AttributeChanges
// ---------------------------------------------------------------------------

/// The part of an attribute table that changed since the last configure.
///
/// `groups` holds the complete regrouped map of every group with at least
/// one changed key, so a backend can reapply a layout as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeChanges {
    changed: BTreeMap<String, Value>,
    removed: Vec<String>,
    groups: BTreeMap<String, BTreeMap<String, Value>>,
}

impl AttributeChanges {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changed.len() + self.removed.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.changed.get(key)
    }

    pub fn changed(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.changed.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every changed or removed key, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .changed
            .keys()
            .chain(&self.removed)
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    pub fn group(&self, name: &str) -> Option<&BTreeMap<String, Value>> {
        self.groups.get(name)
    }

    pub fn position(&self) -> Result<Option<Position>, WidgetError> {
        match self.group(POSITION_GROUP) {
            Some(group) => Position::from_group(group).map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Display for AttributeChanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self
            .changed
            .iter()
            .map(|(k, v)| format!("{k}={}", quoted(v)))
            .collect();
        parts.extend(self.removed.iter().map(|k| format!("-{k}")));
        f.write_str(&parts.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Geometry request from the `pos` group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    Pack(PackOptions),
    Grid(GridOptions),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Padding {
    pub padx: Option<i64>,
    pub pady: Option<i64>,
    pub ipadx: Option<i64>,
    pub ipady: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackOptions {
    pub side: Option<String>,
    pub anchor: Option<String>,
    pub expand: bool,
    pub fill: Option<String>,
    pub padding: Padding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOptions {
    pub column: i64,
    pub row: i64,
    pub columnspan: i64,
    pub rowspan: i64,
    pub sticky: Option<String>,
    pub padding: Padding,
}

const PACK_KEYS: &[&str] = &["pack", "side", "anchor", "expand", "fill"];
const GRID_KEYS: &[&str] = &["grid", "sticky"];
const PAD_KEYS: &[&str] = &["padx", "pady", "ipadx", "ipady"];

impl Position {
    /// Interpret a regrouped `pos` map.
    ///
    /// `grid` takes a `(column, row)` or `(column, row, columnspan,
    /// rowspan)` tuple; `pack` takes a side name or `True`. Without either,
    /// any pack option selects pack geometry.
    pub fn from_group(group: &BTreeMap<String, Value>) -> Result<Self, WidgetError> {
        for key in group.keys() {
            let known = PACK_KEYS.contains(&key.as_str())
                || GRID_KEYS.contains(&key.as_str())
                || PAD_KEYS.contains(&key.as_str());
            if !known {
                return Err(WidgetError::invalid(
                    format!("{POSITION_GROUP}:{key}"),
                    "unknown position option",
                ));
            }
        }
        let is_grid = group.keys().any(|k| GRID_KEYS.contains(&k.as_str()));
        let is_pack = group.keys().any(|k| PACK_KEYS.contains(&k.as_str()));
        if is_grid && is_pack {
            return Err(WidgetError::invalid(POSITION_GROUP, "cannot mix pack and grid options"));
        }
        let padding = Padding {
            padx: int_option(group, "padx")?,
            pady: int_option(group, "pady")?,
            ipadx: int_option(group, "ipadx")?,
            ipady: int_option(group, "ipady")?,
        };
        if is_grid {
            return grid(group, padding);
        }

        let mut side = str_option(group, "side")?;
        match group.get("pack") {
            Some(Value::Str(s)) => side = Some(s.clone()),
            Some(Value::Bool(true)) | None => {}
            Some(other) => {
                return Err(WidgetError::invalid(
                    "pos:pack",
                    format!("expected a side name, got {}", other.type_name()),
                ))
            }
        }
        Ok(Position::Pack(PackOptions {
            side,
            anchor: str_option(group, "anchor")?,
            expand: group.get("expand").is_some_and(Value::is_truthy),
            fill: str_option(group, "fill")?,
            padding,
        }))
    }
}

fn grid(group: &BTreeMap<String, Value>, padding: Padding) -> Result<Position, WidgetError> {
    let cells = match group.get("grid") {
        Some(Value::Tuple(items) | Value::List(items)) => items
            .iter()
            .map(|v| v.as_int())
            .collect::<Option<Vec<i64>>>()
            .ok_or_else(|| WidgetError::invalid("pos:grid", "grid cells must be integers"))?,
        Some(other) => {
            return Err(WidgetError::invalid(
                "pos:grid",
                format!("expected a tuple, got {}", other.type_name()),
            ))
        }
        None => vec![0, 0],
    };
    let (column, row, columnspan, rowspan) = match cells.as_slice() {
        [c, r] => (*c, *r, 1, 1),
        [c, r, cs, rs] => (*c, *r, *cs, *rs),
        _ => {
            return Err(WidgetError::invalid(
                "pos:grid",
                "expected (column, row) or (column, row, columnspan, rowspan)",
            ))
        }
    };
    Ok(Position::Grid(GridOptions {
        column,
        row,
        columnspan,
        rowspan,
        sticky: str_option(group, "sticky")?,
        padding,
    }))
}

fn int_option(group: &BTreeMap<String, Value>, key: &str) -> Result<Option<i64>, WidgetError> {
    match group.get(key) {
        None => Ok(None),
        Some(v) => v.as_int().map(Some).ok_or_else(|| {
            WidgetError::invalid(format!("{POSITION_GROUP}:{key}"), "expected an integer")
        }),
    }
}

fn str_option(group: &BTreeMap<String, Value>, key: &str) -> Result<Option<String>, WidgetError> {
    match group.get(key) {
        None => Ok(None),
        Some(Value::Str(s)) => Ok(Some(s.clone())),
        Some(other) => Err(WidgetError::invalid(
            format!("{POSITION_GROUP}:{key}"),
            format!("expected a string, got {}", other.type_name()),
        )),
    }
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Column (`x`) and row (`y`) stretch weights from the `weight` group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Weights {
    pub x: BTreeMap<i64, i64>,
    pub y: BTreeMap<i64, i64>,
}

impl Weights {
    pub fn from_group(group: &BTreeMap<String, Value>) -> Result<Self, WidgetError> {
        let mut weights = Weights::default();
        for (axis, value) in group {
            let key = format!("{WEIGHT_GROUP}:{axis}");
            let parsed = parse_weights(&key, value)?;
            match axis.as_str() {
                "x" => weights.x = parsed,
                "y" => weights.y = parsed,
                _ => return Err(WidgetError::invalid(key, "expected axis 'x' or 'y'")),
            }
        }
        Ok(weights)
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty()
    }
}

/// `"0:1,1:2"`, a slice `0:1`, a tuple of weights by index, a single
/// weight for index 0, or a map.
fn parse_weights(key: &str, value: &Value) -> Result<BTreeMap<i64, i64>, WidgetError> {
    let bad = |message: &str| WidgetError::invalid(key, message);
    match value {
        Value::Int(w) => Ok(BTreeMap::from([(0, *w)])),
        Value::Slice(s) => match (s.start, s.stop, s.step) {
            (Some(index), Some(w), None) => Ok(BTreeMap::from([(index, w)])),
            _ => Err(bad("expected index:weight")),
        },
        Value::Tuple(items) | Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_int()
                    .map(|w| (i as i64, w))
                    .ok_or_else(|| bad("weights must be integers"))
            })
            .collect(),
        Value::Str(spec) => spec
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(|part| {
                let (index, w) = part
                    .split_once(':')
                    .ok_or_else(|| bad("expected 'index:weight' pairs"))?;
                let index = index.trim().parse().map_err(|_| bad("bad index"))?;
                let w = w.trim().parse().map_err(|_| bad("bad weight"))?;
                Ok((index, w))
            })
            .collect(),
        Value::Map(map) => map
            .iter()
            .map(|(index, w)| {
                let index = index.parse().map_err(|_| bad("bad index"))?;
                let w = w.as_int().ok_or_else(|| bad("weights must be integers"))?;
                Ok((index, w))
            })
            .collect(),
        other => Err(bad(&format!("unsupported weight value {}", other.type_name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Slice;
    use pretty_assertions::assert_eq;

    fn attrs(entries: &[(&str, Value)]) -> ResolvedAttributes {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    fn tuple(items: &[i64]) -> Value {
        Value::Tuple(items.iter().map(|i| Value::Int(*i)).collect())
    }

    // -- Grouping -----------------------------------------------------------

    #[test]
    fn test_group_nests_recursively() {
        let a = attrs(&[
            ("text", "hi".into()),
            ("lay:w:x", "0:1".into()),
            ("lay:w:y", "1:2".into()),
            ("lay:gap", 3.into()),
        ]);
        let group = a.group("lay").unwrap();
        let mut w = BTreeMap::new();
        w.insert("x".to_owned(), Value::from("0:1"));
        w.insert("y".to_owned(), Value::from("1:2"));
        assert_eq!(group.get("w"), Some(&Value::Map(w)));
        assert_eq!(group.get("gap"), Some(&Value::Int(3)));
        assert_eq!(a.group("pos"), None);
        assert_eq!(a.plain().map(|(k, _)| k).collect::<Vec<_>>(), ["text"]);
        assert_eq!(a.group_names().into_iter().collect::<Vec<_>>(), ["lay"]);
    }

    #[test]
    fn test_bindings() {
        let a = attrs(&[("bind:<Return>", "submit".into()), ("text", "x".into())]);
        let b = a.bindings();
        assert_eq!(b.len(), 1);
        assert_eq!(b.get("<Return>"), Some(&Value::from("submit")));
    }

    // -- Diff ---------------------------------------------------------------

    #[test]
    fn test_diff_reports_only_changed_keys() {
        let old = attrs(&[("text", "0".into()), ("width", 10.into())]);
        let new = attrs(&[("text", "1".into()), ("width", 10.into())]);
        let changes = old.diff(&new);
        assert_eq!(changes.keys(), ["text"]);
        assert_eq!(changes.to_string(), r#"text="1""#);
        assert!(old.diff(&old).is_empty());
    }

    #[test]
    fn test_diff_regroups_touched_group() {
        let old = attrs(&[("pos:grid", tuple(&[0, 0])), ("pos:sticky", "nsew".into())]);
        let new = attrs(&[("pos:grid", tuple(&[1, 0])), ("pos:sticky", "nsew".into())]);
        let changes = old.diff(&new);
        assert_eq!(changes.keys(), ["pos:grid"]);
        let group = changes.group("pos").unwrap();
        assert_eq!(group.len(), 2);
        assert!(matches!(
            changes.position().unwrap(),
            Some(Position::Grid(GridOptions { column: 1, row: 0, .. }))
        ));
    }

    #[test]
    fn test_diff_reports_removed_keys() {
        let old = attrs(&[("text", "a".into()), ("image", "x".into())]);
        let new = attrs(&[("text", "a".into())]);
        let changes = old.diff(&new);
        assert_eq!(changes.removed(), ["image".to_owned()]);
        assert_eq!(changes.to_string(), "-image");
    }

    // -- Position -----------------------------------------------------------

    #[test]
    fn test_grid_position() {
        let a = attrs(&[("pos:grid", tuple(&[0, 1, 2, 1])), ("pos:sticky", "ew".into())]);
        assert_eq!(
            a.position().unwrap(),
            Some(Position::Grid(GridOptions {
                column: 0,
                row: 1,
                columnspan: 2,
                rowspan: 1,
                sticky: Some("ew".into()),
                padding: Padding::default(),
            }))
        );
    }

    #[test]
    fn test_pack_position() {
        let a = attrs(&[
            ("pos:pack", "left".into()),
            ("pos:expand", true.into()),
            ("pos:padx", 4.into()),
        ]);
        let Some(Position::Pack(pack)) = a.position().unwrap() else {
            panic!("expected pack geometry");
        };
        assert_eq!(pack.side.as_deref(), Some("left"));
        assert!(pack.expand);
        assert_eq!(pack.padding.padx, Some(4));
    }

    #[test]
    fn test_position_errors() {
        let mixed = attrs(&[("pos:grid", tuple(&[0, 0])), ("pos:side", "top".into())]);
        assert!(mixed.position().is_err());
        let bad_cells = attrs(&[("pos:grid", tuple(&[0, 0, 1]))]);
        assert!(bad_cells.position().is_err());
        let unknown = attrs(&[("pos:column", 1.into())]);
        assert_eq!(
            unknown.position().unwrap_err(),
            WidgetError::invalid("pos:column", "unknown position option")
        );
    }

    // -- Weights ------------------------------------------------------------

    #[test]
    fn test_weights_forms() {
        let a = attrs(&[
            ("weight:x", "0:1, 1:2".into()),
            ("weight:y", Value::Slice(Slice::new(Some(2), Some(5), None))),
        ]);
        let w = a.weights().unwrap();
        assert_eq!(w.x, BTreeMap::from([(0, 1), (1, 2)]));
        assert_eq!(w.y, BTreeMap::from([(2, 5)]));

        let t = attrs(&[("weight:x", tuple(&[1, 0, 3]))]).weights().unwrap();
        assert_eq!(t.x, BTreeMap::from([(0, 1), (1, 0), (2, 3)]));
        assert!(attrs(&[]).weights().unwrap().is_empty());
        assert!(attrs(&[("weight:z", 1.into())]).weights().is_err());
    }
}
