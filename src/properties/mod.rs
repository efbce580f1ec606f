//! Time-varying properties.
//!
//! Every input the geometry updaters consume is a property: it can be
//! sampled at a scene time and reports whether it is constant over time.
//! Sampling outside an interval property's defined range yields `None`,
//! and callers fall back to documented defaults rather than erroring.

pub mod material;

use std::rc::Rc;

use crate::core::time::{SceneTime, TimeInterval};

pub use material::{MaterialProperty, SharedMaterial};

/// A value that may vary over scene time.
#[derive(Clone)]
pub enum Property<T: Clone> {
    /// The same value at every time.
    Constant(T),
    /// Values defined over a set of intervals; `None` outside them.
    Intervals(Vec<(TimeInterval, T)>),
    /// A caller-supplied sampling function. `constant` declares whether
    /// the function's result can change between frames.
    Callback {
        sample: Rc<dyn Fn(SceneTime) -> Option<T>>,
        constant: bool,
    },
}

impl<T: Clone + std::fmt::Debug> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Intervals(intervals) => f.debug_tuple("Intervals").field(intervals).finish(),
            Self::Callback { constant, .. } => f
                .debug_struct("Callback")
                .field("constant", constant)
                .finish_non_exhaustive(),
        }
    }
}

impl<T: Clone + PartialEq> PartialEq for Property<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Constant(a), Self::Constant(b)) => a == b,
            (Self::Intervals(a), Self::Intervals(b)) => a == b,
            (
                Self::Callback { sample: a, .. },
                Self::Callback { sample: b, .. },
            ) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T: Clone> Property<T> {
    #[must_use]
    pub fn constant(value: T) -> Self {
        Self::Constant(value)
    }

    #[must_use]
    pub fn intervals(intervals: Vec<(TimeInterval, T)>) -> Self {
        Self::Intervals(intervals)
    }

    #[must_use]
    pub fn callback(sample: impl Fn(SceneTime) -> Option<T> + 'static, constant: bool) -> Self {
        Self::Callback {
            sample: Rc::new(sample),
            constant,
        }
    }

    /// Samples the property. `None` when the time is outside every defined
    /// interval or the callback declines to produce a value.
    #[must_use]
    pub fn get_value(&self, time: SceneTime) -> Option<T> {
        match self {
            Self::Constant(value) => Some(value.clone()),
            Self::Intervals(intervals) => intervals
                .iter()
                .find(|(interval, _)| interval.contains(time))
                .map(|(_, value)| value.clone()),
            Self::Callback { sample, .. } => sample(time),
        }
    }

    #[must_use]
    pub fn is_constant(&self) -> bool {
        match self {
            Self::Constant(_) => true,
            Self::Intervals(_) => false,
            Self::Callback { constant, .. } => *constant,
        }
    }
}

impl<T: Clone> From<T> for Property<T> {
    fn from(value: T) -> Self {
        Self::Constant(value)
    }
}

/// Samples an optional property, substituting `default` when the property
/// is absent or undefined at `time`.
#[must_use]
pub fn value_or<T: Clone>(property: Option<&Property<T>>, time: SceneTime, default: T) -> T {
    property
        .and_then(|property| property.get_value(time))
        .unwrap_or(default)
}

/// Samples an optional property; absent properties yield `None`.
#[must_use]
pub fn value_or_undefined<T: Clone>(property: Option<&Property<T>>, time: SceneTime) -> Option<T> {
    property.and_then(|property| property.get_value(time))
}

/// An absent property counts as constant.
#[must_use]
pub fn is_constant<T: Clone>(property: Option<&Property<T>>) -> bool {
    property.is_none_or(Property::is_constant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_property_is_undefined_outside_range() {
        let property = Property::intervals(vec![(
            TimeInterval::new(SceneTime::from_seconds(0.0), SceneTime::from_seconds(10.0)),
            5_u32,
        )]);
        assert_eq!(property.get_value(SceneTime::from_seconds(5.0)), Some(5));
        assert_eq!(property.get_value(SceneTime::from_seconds(11.0)), None);
        assert!(!property.is_constant());
    }

    #[test]
    fn value_or_falls_back_to_default() {
        let property = Property::intervals(vec![(
            TimeInterval::new(SceneTime::from_seconds(0.0), SceneTime::from_seconds(1.0)),
            2.0_f64,
        )]);
        assert_eq!(value_or(Some(&property), SceneTime::from_seconds(5.0), 9.0), 9.0);
        assert_eq!(value_or::<f64>(None, SceneTime::from_seconds(5.0), 9.0), 9.0);
    }

    #[test]
    fn absent_property_is_constant() {
        assert!(is_constant::<bool>(None));
        assert!(is_constant(Some(&Property::constant(true))));
        assert!(!is_constant(Some(&Property::<bool>::callback(
            |_| Some(true),
            false
        ))));
    }

    #[test]
    fn callback_equality_is_by_identity() {
        let a = Property::<u32>::callback(|_| Some(1), true);
        let b = a.clone();
        let c = Property::<u32>::callback(|_| Some(1), true);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
