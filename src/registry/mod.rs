//! Function contract registry.
//!
//! Assembled once from the built-in WordPress tables plus whatever the
//! configuration adds, then shared read-only by every file analysis.

pub mod wordpress;

use crate::config::{Config, ContractShape};
use crate::diagnostics::Severity;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A fully slashed argument: 1-based position and parameter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashedArg {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MixedKeys {
    pub slashed: BTreeSet<String>,
    pub unslashed: BTreeSet<String>,
}

/// What a function expects of its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallContract {
    /// Every listed argument must be slashed as a whole.
    FullySlashed(Vec<SlashedArg>),
    /// Array arguments where only the listed keys must be slashed.
    PartlySlashed(BTreeMap<usize, BTreeSet<String>>),
    /// Array arguments with keys that must be slashed and keys that must not be.
    Mixed(BTreeMap<usize, MixedKeys>),
}

/// Skip a call's fully slashed check when a literal `argument` differs from `sentinel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRule {
    pub argument: usize,
    pub sentinel: String,
}

#[derive(Debug, Clone)]
pub struct Registry {
    contracts: HashMap<String, Vec<CallContract>>,
    selectors: HashMap<String, SelectorRule>,
    slashing_functions: HashSet<String>,
    auto_slashing_functions: HashSet<String>,
    raw_input: HashSet<String>,
    verification_functions: HashSet<String>,
    nonce_error_for: HashSet<String>,
    nonce_warn_for: HashSet<String>,
}

fn owned_set<'a>(items: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    items.into_iter().map(str::to_string).collect()
}

fn key_set<S: AsRef<str>>(keys: &[S]) -> BTreeSet<String> {
    keys.iter().map(|k| k.as_ref().to_string()).collect()
}

impl Registry {
    /// The built-in WordPress tables with default settings.
    pub fn wordpress() -> Self {
        Self::build(&Config::default())
    }

    /// Built-in tables merged with the configured additions.
    pub fn build(config: &Config) -> Self {
        let mut contracts: HashMap<String, Vec<CallContract>> = HashMap::new();

        for (name, args) in wordpress::PARTLY_SLASHED {
            let map = args
                .iter()
                .map(|(index, keys)| (*index, key_set(*keys)))
                .collect();
            contracts
                .entry(name.to_string())
                .or_default()
                .push(CallContract::PartlySlashed(map));
        }
        for (name, args) in wordpress::MIXED_SLASHED {
            let map = args
                .iter()
                .map(|(index, slashed, unslashed)| {
                    let keys = MixedKeys {
                        slashed: key_set(*slashed),
                        unslashed: key_set(*unslashed),
                    };
                    (*index, keys)
                })
                .collect();
            contracts
                .entry(name.to_string())
                .or_default()
                .push(CallContract::Mixed(map));
        }
        for (name, args) in wordpress::FULLY_SLASHED {
            let args = args
                .iter()
                .map(|(index, arg)| SlashedArg {
                    index: *index,
                    name: arg.to_string(),
                })
                .collect();
            contracts
                .entry(name.to_string())
                .or_default()
                .push(CallContract::FullySlashed(args));
        }

        for custom in &config.slashing.contracts {
            contracts
                .entry(custom.function.clone())
                .or_default()
                .push(contract_from_shape(&custom.shape));
        }

        let mut selectors: HashMap<String, SelectorRule> = wordpress::SELECTORS
            .iter()
            .map(|(name, argument, sentinel)| {
                let rule = SelectorRule {
                    argument: *argument,
                    sentinel: sentinel.to_string(),
                };
                (name.to_string(), rule)
            })
            .collect();
        for selector in &config.slashing.selectors {
            selectors.insert(
                selector.function.clone(),
                SelectorRule {
                    argument: selector.argument,
                    sentinel: selector.sentinel.clone(),
                },
            );
        }

        let mut slashing_functions = owned_set(wordpress::SLASHING_FUNCTIONS.iter().copied());
        slashing_functions.extend(config.slashing.custom_slashing_functions.iter().cloned());

        let mut auto_slashing_functions =
            owned_set(wordpress::AUTO_SLASHING_FUNCTIONS.iter().copied());
        auto_slashing_functions.extend(
            config
                .slashing
                .custom_auto_slashing_functions
                .iter()
                .cloned(),
        );

        let mut verification_functions =
            owned_set(wordpress::NONCE_VERIFICATION_FUNCTIONS.iter().copied());
        verification_functions.extend(config.nonce.custom_verification_functions.iter().cloned());

        Self {
            contracts,
            selectors,
            slashing_functions,
            auto_slashing_functions,
            raw_input: config.slashing.raw_input.iter().cloned().collect(),
            verification_functions,
            nonce_error_for: config.nonce.error_for.iter().cloned().collect(),
            nonce_warn_for: config.nonce.warn_for.iter().cloned().collect(),
        }
    }

    /// Contracts registered for a call name, in registration order.
    pub fn contracts_for(&self, name: &str) -> &[CallContract] {
        self.contracts.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_contract(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    pub fn selector_for(&self, name: &str) -> Option<&SelectorRule> {
        self.selectors.get(name)
    }

    /// `wp_slash()` and friends, plus functions whose output is always safe.
    pub fn is_slashing_function(&self, name: &str) -> bool {
        self.slashing_functions.contains(name) || self.auto_slashing_functions.contains(name)
    }

    pub fn is_raw_input(&self, variable: &str) -> bool {
        self.raw_input.contains(variable)
    }

    pub fn is_verification_function(&self, name: &str) -> bool {
        self.verification_functions.contains(name)
    }

    /// Severity for an unverified use of `variable`, `None` when it is not watched.
    pub fn nonce_severity(&self, variable: &str) -> Option<Severity> {
        if self.nonce_error_for.contains(variable) {
            Some(Severity::Error)
        } else if self.nonce_warn_for.contains(variable) {
            Some(Severity::Warning)
        } else {
            None
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::wordpress()
    }
}

fn contract_from_shape(shape: &ContractShape) -> CallContract {
    match shape {
        ContractShape::Fully { args } => CallContract::FullySlashed(
            args.iter()
                .map(|arg| SlashedArg {
                    index: arg.index,
                    name: arg.name.clone(),
                })
                .collect(),
        ),
        ContractShape::Partly { args } => CallContract::PartlySlashed(
            args.iter()
                .map(|arg| (arg.index, key_set(arg.slashed.as_slice())))
                .collect(),
        ),
        ContractShape::Mixed { args } => CallContract::Mixed(
            args.iter()
                .map(|arg| {
                    let keys = MixedKeys {
                        slashed: key_set(arg.slashed.as_slice()),
                        unslashed: key_set(arg.unslashed.as_slice()),
                    };
                    (arg.index, keys)
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CustomContract, NamedArg, SelectorConfig};

    #[test]
    fn test_function_with_several_contracts_keeps_all() {
        let registry = Registry::wordpress();
        let contracts = registry.contracts_for("wp_insert_term");
        assert_eq!(contracts.len(), 2);
        assert!(matches!(contracts[0], CallContract::PartlySlashed(_)));
        assert!(matches!(contracts[1], CallContract::FullySlashed(_)));
    }

    #[test]
    fn test_unknown_function_has_no_contracts() {
        let registry = Registry::wordpress();
        assert!(registry.contracts_for("strlen").is_empty());
        assert!(!registry.has_contract("strlen"));
    }

    #[test]
    fn test_mixed_contract_keys() {
        let registry = Registry::wordpress();
        let CallContract::Mixed(args) = &registry.contracts_for("wp_insert_user")[0] else {
            panic!("expected a mixed contract");
        };
        let keys = &args[&1];
        assert!(keys.slashed.contains("user_email"));
        assert!(keys.unslashed.contains("user_pass"));
    }

    #[test]
    fn test_nonce_error_set_wins_over_warning_set() {
        let mut config = Config::default();
        config.nonce.warn_for.push("$_POST".to_string());
        let registry = Registry::build(&config);
        assert_eq!(registry.nonce_severity("$_POST"), Some(Severity::Error));
        assert_eq!(registry.nonce_severity("$_GET"), Some(Severity::Warning));
        assert_eq!(registry.nonce_severity("$_COOKIE"), None);
    }

    #[test]
    fn test_configured_additions_are_merged() {
        let mut config = Config::default();
        config
            .nonce
            .custom_verification_functions
            .push("my_verify".to_string());
        config
            .slashing
            .custom_auto_slashing_functions
            .push("absint".to_string());
        config.slashing.contracts.push(CustomContract {
            function: "my_store".to_string(),
            shape: ContractShape::Fully {
                args: vec![NamedArg {
                    index: 2,
                    name: "value".to_string(),
                }],
            },
        });
        config.slashing.selectors.push(SelectorConfig {
            function: "my_lookup".to_string(),
            argument: 1,
            sentinel: "title".to_string(),
        });

        let registry = Registry::build(&config);
        assert!(registry.is_verification_function("my_verify"));
        assert!(registry.is_verification_function("wp_verify_nonce"));
        assert!(registry.is_slashing_function("absint"));
        assert!(registry.is_slashing_function("wp_slash"));
        assert_eq!(
            registry.contracts_for("my_store"),
            &[CallContract::FullySlashed(vec![SlashedArg {
                index: 2,
                name: "value".to_string()
            }])]
        );
        assert_eq!(registry.selector_for("my_lookup").unwrap().sentinel, "title");
        assert_eq!(registry.selector_for("get_term_by").unwrap().argument, 1);
    }
}
