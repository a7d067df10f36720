use std::collections::HashMap;
use lazy_static::lazy_static;
use log::debug;
use thiserror::Error;

use super::{iem3000::Iem3000Producer, sdm::SdmProducer, Producer};

pub type ProducerConstructor = fn() -> Box<dyn Producer>;

#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("Meter model {0} is not known")]
    UnknownModel(String),
}

/// Maps exact model names to producer constructors
#[derive(Default)]
pub struct Registry {
    constructors: HashMap<String, ProducerConstructor>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { constructors: HashMap::new() }
    }

    /// Registry with every meter model shipped in this crate
    pub fn builtin() -> Self {
        let mut r = Registry::new();
        r.register("IEM3000", new_iem3000);
        r.register("SDM", new_sdm);
        return r;
    }

    /// Adding a name twice replaces the earlier constructor
    pub fn register(&mut self, name: &str, constructor: ProducerConstructor) {
        if self.constructors.insert(name.to_string(), constructor).is_some() {
            debug!("Meter model {name} registered again, replacing it");
        }
    }

    /// Builds a fresh producer on every call
    pub fn lookup(&self, name: &str) -> Result<Box<dyn Producer>, RegistryError> {
        match self.constructors.get(name) {
            Some(constructor) => Ok(constructor()),
            None => Err(RegistryError::UnknownModel(name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }
}

fn new_iem3000() -> Box<dyn Producer> {
    Box::new(Iem3000Producer::new())
}

fn new_sdm() -> Box<dyn Producer> {
    Box::new(SdmProducer::new())
}

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::builtin();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::Measurement;
    use crate::meters::{FunctionCode, Operation, Transform};
    use std::collections::HashSet;

    struct FixedProducer;

    impl Producer for FixedProducer {
        fn description(&self) -> &str {
            "fixed"
        }

        fn probe(&self) -> Operation {
            Operation::new(FunctionCode::ReadHoldingRegisters, 1, Measurement::Frequency, Transform::Uint16)
        }

        fn produce(&self) -> Vec<Operation> {
            vec![self.probe()]
        }
    }

    fn new_fixed() -> Box<dyn Producer> {
        Box::new(FixedProducer)
    }

    #[test]
    fn test_lookup_iem3000() {
        let p = REGISTRY.lookup("IEM3000").unwrap();
        assert_eq!(p.description(), "Schneider Electric iEM3000 series");
    }

    #[test]
    fn test_lookup_returns_fresh_instances() {
        let a = REGISTRY.lookup("IEM3000").unwrap();
        let b = REGISTRY.lookup("IEM3000").unwrap();
        let pa: *const dyn Producer = a.as_ref();
        let pb: *const dyn Producer = b.as_ref();
        assert!(!std::ptr::addr_eq(pa, pb));
        assert_eq!(a.produce().len(), b.produce().len());
    }

    #[test]
    fn test_lookup_unknown() {
        match REGISTRY.lookup("unknown-model") {
            Err(e) => {
                assert_eq!(e, RegistryError::UnknownModel("unknown-model".to_string()));
                assert_eq!(e.to_string(), "Meter model unknown-model is not known");
            }
            Ok(_) => panic!("unknown model must not resolve"),
        }
        assert!(REGISTRY.lookup("iem3000").is_err());
    }

    #[test]
    fn test_register_overwrites() {
        let mut r = Registry::builtin();
        r.register("IEM3000", new_fixed);
        assert_eq!(r.lookup("IEM3000").unwrap().description(), "fixed");
        assert_eq!(r.names(), vec!["IEM3000".to_string(), "SDM".to_string()]);
    }

    #[test]
    fn test_every_builtin_model_is_consistent() {
        for name in REGISTRY.names() {
            let p = REGISTRY.lookup(&name).unwrap();
            let ops = p.produce();
            let ids: HashSet<Measurement> = ops.iter().map(|o| o.measurement()).collect();
            assert_eq!(ids.len(), ops.len(), "{name} produced a measurement twice");
            assert!(ids.contains(&p.probe().measurement()), "{name} probe not in plan");

            for op in ops {
                match op.transform() {
                    Transform::Float32 => assert_eq!(op.word_length(), 2),
                    Transform::Scaled { inner, .. } if **inner == Transform::Float32 => assert_eq!(op.word_length(), 2),
                    Transform::Scaled { inner, .. } if **inner == Transform::Int64 => assert_eq!(op.word_length(), 4),
                    _ => {}
                }
            }
        }
    }
}
