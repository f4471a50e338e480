//! Clearance rules: which rules apply, and the clearance each net ends up with.

use std::collections::HashMap;

use super::keywords::FieldKey;
use super::tree::FieldRef;
use crate::types::{Coord, Net, NetId};

/// Objects a rule scope expression selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Class(String),
    Net(String),
}

impl Scope {
    pub fn parse(expr: &str) -> Option<Self> {
        let expr = expr.trim();
        if ["All", "Board", "IsBoard"]
            .iter()
            .any(|k| expr.eq_ignore_ascii_case(k))
        {
            return Some(Self::All);
        }
        let (func, arg) = expr.split_once('(')?;
        let arg = arg.strip_suffix(')')?.trim();
        let arg = arg
            .strip_prefix('\'')
            .and_then(|a| a.strip_suffix('\''))
            .or_else(|| arg.strip_prefix('"').and_then(|a| a.strip_suffix('"')))
            .unwrap_or(arg);
        match func.trim().to_ascii_lowercase().as_str() {
            "innetclass" => Some(Self::Class(arg.to_string())),
            "innet" => Some(Self::Net(arg.to_string())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearanceRule {
    pub name: String,
    pub first: Scope,
    pub second: Scope,
    pub gap: Coord,
}

/// Pick out the clearance rules the importer honours.
///
/// `Ok(None)` is a rule of another kind or one that is disabled; `Err` is a
/// clearance rule that cannot be used.
pub fn read_rule<'t>(
    fields: impl Iterator<Item = FieldRef<'t>>,
) -> Result<Option<ClearanceRule>, String> {
    let mut name = String::new();
    let mut enabled = false;
    let mut clearance = false;
    let mut net_scope = None;
    let mut layer_kind = None;
    let mut scopes = [None, None];
    let mut gap = None;
    for f in fields {
        match f.key() {
            FieldKey::Name => name = f.str().into_owned(),
            FieldKey::Enabled => enabled = f.bool().unwrap_or(false),
            FieldKey::RuleKind => clearance = f.str().trim().eq_ignore_ascii_case("Clearance"),
            FieldKey::NetScope => net_scope = Some(f.str().trim().to_ascii_lowercase()),
            FieldKey::LayerKind => layer_kind = Some(f.str().trim().to_ascii_lowercase()),
            FieldKey::Scope1Expression => scopes[0] = Some(f.str().into_owned()),
            FieldKey::Scope2Expression => scopes[1] = Some(f.str().into_owned()),
            FieldKey::Gap => gap = f.coord(),
            _ => {}
        }
    }
    if !clearance || !enabled {
        return Ok(None);
    }
    if !matches!(net_scope.as_deref(), Some("differentnets" | "anynet")) {
        return Ok(None);
    }
    if layer_kind.as_deref() != Some("samelayer") {
        return Ok(None);
    }
    let gap = gap.ok_or("clearance rule without GAP")?;
    let [first, second] = scopes.map(|s| s.unwrap_or_else(|| "All".to_string()));
    let parse = |expr: &str| {
        Scope::parse(expr).ok_or_else(|| format!("unsupported scope expression '{expr}'"))
    };
    Ok(Some(ClearanceRule {
        name,
        first: parse(&first)?,
        second: parse(&second)?,
        gap,
    }))
}

/// Global clearance plus per-net overrides. Later rules win.
#[derive(Debug, Default)]
pub struct Clearances {
    default: Option<Coord>,
    overrides: HashMap<NetId, Coord>,
}

impl Clearances {
    pub fn apply(&mut self, rule: &ClearanceRule, nets: &[Net]) -> Result<(), String> {
        let target = match (&rule.first, &rule.second) {
            (Scope::All, Scope::All) => {
                self.default = Some(rule.gap);
                return Ok(());
            }
            (Scope::All, other) | (other, Scope::All) => other,
            _ => return Err("only rules between one scope and all objects are supported".to_string()),
        };
        match target {
            Scope::Class(class) => {
                for (i, net) in nets.iter().enumerate() {
                    if net.class.as_deref() == Some(class.as_str()) {
                        self.overrides.insert(NetId(i), rule.gap);
                    }
                }
            }
            Scope::Net(name) => {
                let id = nets
                    .iter()
                    .position(|n| &n.name == name)
                    .ok_or_else(|| format!("unknown net '{name}'"))?;
                self.overrides.insert(NetId(id), rule.gap);
            }
            Scope::All => {}
        }
        Ok(())
    }

    pub fn effective(&self, net: Option<NetId>, fallback: Coord) -> Coord {
        net.and_then(|n| self.overrides.get(&n).copied())
            .or(self.default)
            .unwrap_or(fallback)
    }
}
