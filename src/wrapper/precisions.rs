//! Precisions wrap one another the same way states do.

use std::{any::Any, fmt::Debug, sync::Arc};

use super::{iter_preorder, AsAny, PreorderIter, Wrappable};

pub trait Precision: AsAny + Debug + Send + Sync + 'static {
    fn wrapped_precisions(&self) -> &[Arc<dyn Precision>] {
        &[]
    }
}

impl Wrappable for dyn Precision {
    fn wrapped(&self) -> &[Arc<Self>] {
        self.wrapped_precisions()
    }

    fn any_ref(&self) -> &dyn Any {
        self.as_any()
    }
}

pub fn as_iter(precision: &dyn Precision) -> PreorderIter<'_, dyn Precision> {
    iter_preorder(precision)
}

pub fn extract_precision_by_type<P: Precision>(precision: &dyn Precision) -> Option<&P> {
    super::extract_by_type::<P, dyn Precision>(precision)
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug)]
    struct Composite(Vec<Arc<dyn Precision>>);

    impl Precision for Composite {
        fn wrapped_precisions(&self) -> &[Arc<dyn Precision>] {
            &self.0
        }
    }

    #[derive(Debug, PartialEq)]
    struct Predicates(usize);

    impl Precision for Predicates {}

    #[derive(Debug)]
    struct Locations;

    impl Precision for Locations {}

    #[test]
    fn finds_the_component_precision() {
        let precision = Composite(vec![Arc::new(Locations), Arc::new(Predicates(3))]);

        assert_eq!(as_iter(&precision).count(), 3);
        assert_eq!(
            extract_precision_by_type::<Predicates>(&precision),
            Some(&Predicates(3))
        );
        assert!(extract_precision_by_type::<Composite>(&Locations).is_none());
    }
}
