//! Request chain resolution.
//!
//! A mold may name a previous request through `prev_req`. Following those
//! names from a target back to a mold without one (or to a name that matches
//! nothing) gives the chain that must run before the target.

use crate::models::Mold;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Errors raised while resolving a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The previous-request references loop back on themselves.
    ///
    /// `chain` lists the names in the loop, starting and ending with the
    /// mold that closes it.
    Cycle { chain: Vec<String> },
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::Cycle { chain } => {
                write!(f, "Request chain has a cycle: {}", chain.join(" -> "))
            }
        }
    }
}

impl std::error::Error for ChainError {}

/// Resolves the chain ending at `target`, ascendants first.
///
/// Names are looked up in `all`; if several molds share a name the first one
/// wins. A reference to a name that matches nothing ends the chain quietly.
///
/// # Errors
///
/// [`ChainError::Cycle`] if following the references revisits a mold,
/// including a mold that names itself.
///
/// # Examples
///
/// ```
/// use request_mold::chain::resolve;
/// use request_mold::models::Mold;
///
/// let login = Mold::lua("return {}").with_name("login");
/// let me = Mold::lua("return {}").with_name("me").with_prev_req("login");
/// let all = vec![login.clone(), me.clone()];
///
/// let chain = resolve(&me, &all).unwrap();
/// let names: Vec<&str> = chain.iter().map(|m| m.name.as_str()).collect();
/// assert_eq!(names, ["login", "me"]);
/// ```
pub fn resolve(target: &Mold, all: &[Mold]) -> Result<Vec<Mold>, ChainError> {
    let mut by_name: HashMap<&str, &Mold> = HashMap::with_capacity(all.len());
    for mold in all {
        by_name.entry(mold.name.as_str()).or_insert(mold);
    }

    let mut chain = vec![target.clone()];
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(target.name.as_str());
    let mut path: Vec<&str> = vec![target.name.as_str()];

    let mut current = target;
    while let Some(prev_name) = current.prev_req.as_deref() {
        let Some(prev) = by_name.get(prev_name).copied() else {
            log::debug!(
                "'{}' refers to unknown request '{}', chain ends here",
                current.name,
                prev_name
            );
            break;
        };

        if !visited.insert(prev.name.as_str()) {
            let start = path
                .iter()
                .position(|name| *name == prev.name)
                .unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
            cycle.push(prev.name.clone());
            return Err(ChainError::Cycle { chain: cycle });
        }

        path.push(prev.name.as_str());
        chain.push(prev.clone());
        current = prev;
    }

    chain.reverse();
    Ok(chain)
}

/// Names of the molds that run before `target`, in run order.
pub fn ascendant_names(target: &Mold, all: &[Mold]) -> Result<Vec<String>, ChainError> {
    let chain = resolve(target, all)?;
    Ok(chain[..chain.len() - 1]
        .iter()
        .map(|mold| mold.name.clone())
        .collect())
}
