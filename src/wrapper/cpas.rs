//! Composite analyses: looking up a component analysis by its type.

use std::{any::Any, fmt::Debug, sync::Arc};

use super::{iter_preorder, AsAny, PreorderIter, Wrappable};

pub trait ConfigurableProgramAnalysis: AsAny + Debug + Send + Sync + 'static {
    fn name(&self) -> &str;

    fn wrapped_cpas(&self) -> &[Arc<dyn ConfigurableProgramAnalysis>] {
        &[]
    }
}

impl Wrappable for dyn ConfigurableProgramAnalysis {
    fn wrapped(&self) -> &[Arc<Self>] {
        self.wrapped_cpas()
    }

    fn any_ref(&self) -> &dyn Any {
        self.as_any()
    }
}

pub fn as_iter(
    cpa: &dyn ConfigurableProgramAnalysis,
) -> PreorderIter<'_, dyn ConfigurableProgramAnalysis> {
    iter_preorder(cpa)
}

/// The first analysis of type `C` in the composition, `cpa` included.
pub fn retrieve_cpa<C: ConfigurableProgramAnalysis>(
    cpa: &dyn ConfigurableProgramAnalysis,
) -> Option<&C> {
    super::extract_by_type::<C, dyn ConfigurableProgramAnalysis>(cpa)
}

/// Names of all analyses in the composition, in pre-order.
pub fn cpa_names(cpa: &dyn ConfigurableProgramAnalysis) -> Vec<&str> {
    as_iter(cpa).map(|c| c.name()).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug)]
    struct Arg(Arc<dyn ConfigurableProgramAnalysis>);

    impl ConfigurableProgramAnalysis for Arg {
        fn name(&self) -> &str {
            "ARGCPA"
        }

        fn wrapped_cpas(&self) -> &[Arc<dyn ConfigurableProgramAnalysis>] {
            std::slice::from_ref(&self.0)
        }
    }

    #[derive(Debug)]
    struct Composite(Vec<Arc<dyn ConfigurableProgramAnalysis>>);

    impl ConfigurableProgramAnalysis for Composite {
        fn name(&self) -> &str {
            "CompositeCPA"
        }

        fn wrapped_cpas(&self) -> &[Arc<dyn ConfigurableProgramAnalysis>] {
            &self.0
        }
    }

    #[derive(Debug)]
    struct Leaf(&'static str);

    impl ConfigurableProgramAnalysis for Leaf {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn single_wrapper_is_just_one_child() {
        let cpa = Arg(Arc::new(Composite(vec![
            Arc::new(Leaf("LocationCPA")),
            Arc::new(Leaf("PredicateCPA")),
        ])));

        insta::assert_snapshot!(cpa_names(&cpa).join(" > "), @"ARGCPA > CompositeCPA > LocationCPA > PredicateCPA");
        assert_eq!(retrieve_cpa::<Leaf>(&cpa).map(|l| l.0), Some("LocationCPA"));
        assert!(retrieve_cpa::<Arg>(&Leaf("x")).is_none());
    }
}
