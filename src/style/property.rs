use std::fmt;
use std::mem;

use smol_str::SmolStr;

use crate::view::{Element, ElementCore, ElementId};

use super::{FromThemeValue, ThemeEngine, ThemeValue};

/// What a property change dirties on its owner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Invalidates {
    #[default]
    None,
    /// Re-measure the owner (and everything above it).
    SelfLayout,
    /// Re-measure the owner's parent; the owner itself keeps its size.
    ParentLayout,
    /// Rebuild the owner's render batch only.
    Visuals,
}

/// Access the property machinery needs while reading or writing a value.
pub struct PropertyCx<'a> {
    owner: ElementId,
    theme: &'a ThemeEngine,
    invalidations: &'a mut Vec<(ElementId, Invalidates)>,
}

impl<'a> PropertyCx<'a> {
    pub fn new(
        owner: ElementId,
        theme: &'a ThemeEngine,
        invalidations: &'a mut Vec<(ElementId, Invalidates)>,
    ) -> Self {
        Self {
            owner,
            theme,
            invalidations,
        }
    }

    pub fn owner(&self) -> ElementId {
        self.owner
    }

    pub fn theme(&self) -> &ThemeEngine {
        self.theme
    }

    fn invalidate(&mut self, category: Invalidates) {
        if category != Invalidates::None {
            self.invalidations.push((self.owner, category));
        }
    }
}

struct ThemeBinding<T> {
    key: SmolStr,
    convert: fn(&ThemeValue) -> Option<T>,
}

type ChangeCallback<T> = Box<dyn FnMut(ElementId, &T, &T)>;

/// Observable, themeable element field.
pub struct UiProperty<T> {
    value: T,
    default: T,
    is_set: bool,
    /// A theme value is stored in `value`; cleared by `unset`.
    resolved: bool,
    invalidates: Invalidates,
    theme: Option<ThemeBinding<T>>,
    getter: Option<Box<dyn Fn(&T) -> T>>,
    setter: Option<Box<dyn Fn(T) -> T>>,
    on_change: Option<ChangeCallback<T>>,
}

impl<T: Clone + 'static> UiProperty<T> {
    pub fn new(default: T, invalidates: Invalidates) -> Self {
        Self {
            value: default.clone(),
            default,
            is_set: false,
            resolved: false,
            invalidates,
            theme: None,
            getter: None,
            setter: None,
            on_change: None,
        }
    }

    /// Falls back to `key` in the tree's theme while unset.
    pub fn themed(mut self, key: impl Into<SmolStr>) -> Self
    where
        T: FromThemeValue,
    {
        self.theme = Some(ThemeBinding {
            key: key.into(),
            convert: T::from_theme_value,
        });
        self
    }

    /// Computes the value of an unset property on read. The computed value is
    /// stored through [`UiProperty::set`], so the first read marks the
    /// property set and fires its invalidation and change callback.
    pub fn with_getter(mut self, getter: impl Fn(&T) -> T + 'static) -> Self {
        self.getter = Some(Box::new(getter));
        self
    }

    /// Transforms every incoming value before it is stored.
    pub fn with_setter(mut self, setter: impl Fn(T) -> T + 'static) -> Self {
        self.setter = Some(Box::new(setter));
        self
    }

    pub fn on_change(mut self, callback: impl FnMut(ElementId, &T, &T) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn get(&mut self, cx: &mut PropertyCx<'_>) -> T {
        if !self.is_set {
            if !self.resolved {
                if let Some(binding) = &self.theme {
                    if let Some(themed) = cx.theme.get(&binding.key).and_then(binding.convert) {
                        self.value = themed;
                        self.resolved = true;
                    }
                }
            }
            let computed = self.getter.as_ref().map(|getter| getter(&self.value));
            if let Some(computed) = computed {
                self.set(computed, cx);
            }
        }
        self.value.clone()
    }

    pub fn set(&mut self, value: T, cx: &mut PropertyCx<'_>) {
        let value = match &self.setter {
            Some(setter) => setter(value),
            None => value,
        };
        let old = mem::replace(&mut self.value, value);
        self.is_set = true;
        if let Some(callback) = self.on_change.as_mut() {
            callback(cx.owner, &old, &self.value);
        }
        cx.invalidate(self.invalidates);
    }

    /// Drops the explicit or cached theme value; the next read resolves from
    /// the theme again.
    pub fn unset(&mut self, cx: &mut PropertyCx<'_>) {
        let was_set = self.is_set;
        if !was_set && !self.resolved {
            return;
        }
        self.value = self.default.clone();
        self.is_set = false;
        self.resolved = false;
        if was_set {
            cx.invalidate(self.invalidates);
        }
    }

    /// Current stored value without theme or getter resolution.
    pub fn peek(&self) -> &T {
        &self.value
    }

    pub fn is_set(&self) -> bool {
        self.is_set
    }

    pub fn invalidates(&self) -> Invalidates {
        self.invalidates
    }

    pub fn theme_key(&self) -> Option<&str> {
        self.theme.as_ref().map(|binding| binding.key.as_str())
    }
}

impl<T: fmt::Debug> fmt::Debug for UiProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiProperty")
            .field("value", &self.value)
            .field("is_set", &self.is_set)
            .field("invalidates", &self.invalidates)
            .field("theme_key", &self.theme.as_ref().map(|b| &b.key))
            .finish()
    }
}

/// Something a [`Property`] can live on: the common element core or a
/// concrete element kind.
pub trait PropertyOwner: 'static {
    fn project<'a>(
        core: &'a mut ElementCore,
        kind: Option<&'a mut (dyn Element + 'static)>,
    ) -> &'a mut Self;
}

impl PropertyOwner for ElementCore {
    fn project<'a>(
        core: &'a mut ElementCore,
        _kind: Option<&'a mut (dyn Element + 'static)>,
    ) -> &'a mut Self {
        core
    }
}

/// Downcast used by element kinds that own properties.
pub fn project_kind<'a, K: Element>(kind: Option<&'a mut (dyn Element + 'static)>) -> &'a mut K {
    match kind {
        Some(kind) => {
            let name = kind.name();
            kind.as_any_mut().downcast_mut::<K>().unwrap_or_else(|| {
                panic!("{name} element has no {} properties", std::any::type_name::<K>())
            })
        }
        None => panic!("element is busy; its kind properties are reachable through `self`"),
    }
}

/// Typed key for one property slot.
pub trait Property: 'static {
    type Owner: PropertyOwner;
    type Value: Clone + 'static;

    fn slot(owner: &mut Self::Owner) -> &mut UiProperty<Self::Value>;
}

/// `ui_property!(pub Width: ElementCore => width: Option<f32>);`
macro_rules! ui_property {
    ($(#[$meta:meta])* $vis:vis $name:ident: $owner:ty => $field:ident: $value:ty) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        $vis struct $name;

        impl $crate::style::Property for $name {
            type Owner = $owner;
            type Value = $value;

            fn slot(owner: &mut $owner) -> &mut $crate::style::UiProperty<$value> {
                &mut owner.$field
            }
        }
    };
}

/// Lets an element kind own properties addressed through the tree.
macro_rules! kind_property_owner {
    ($kind:ty) => {
        impl $crate::style::PropertyOwner for $kind {
            fn project<'a>(
                _core: &'a mut $crate::view::ElementCore,
                kind: Option<&'a mut (dyn $crate::view::Element + 'static)>,
            ) -> &'a mut Self {
                $crate::style::project_kind(kind)
            }
        }
    };
}

pub(crate) use kind_property_owner;
pub(crate) use ui_property;

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use slotmap::SlotMap;

    use super::{Invalidates, PropertyCx, UiProperty};
    use crate::style::{ThemeEngine, ThemeValue};
    use crate::view::ElementId;

    fn owner() -> ElementId {
        let mut ids: SlotMap<ElementId, ()> = SlotMap::with_key();
        ids.insert(())
    }

    #[test]
    fn set_fires_callback_and_invalidation() {
        let id = owner();
        let theme = ThemeEngine::new();
        let mut pending = Vec::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let mut prop = UiProperty::new(1.0_f32, Invalidates::SelfLayout)
            .on_change(move |_, old, new| sink.borrow_mut().push((*old, *new)));

        let mut cx = PropertyCx::new(id, &theme, &mut pending);
        prop.set(2.0, &mut cx);
        prop.set(2.0, &mut cx);
        assert_eq!(*log.borrow(), vec![(1.0, 2.0), (2.0, 2.0)]);
        assert_eq!(pending, vec![(id, Invalidates::SelfLayout); 2]);
    }

    #[test]
    fn unset_themed_property_reads_theme_without_side_effects() {
        let id = owner();
        let theme = ThemeEngine::new().with("text.size", ThemeValue::Number(18.0));
        let mut pending = Vec::new();
        let mut prop = UiProperty::new(12.0_f32, Invalidates::Visuals).themed("text.size");

        let mut cx = PropertyCx::new(id, &theme, &mut pending);
        assert_eq!(prop.get(&mut cx), 18.0);
        assert!(!prop.is_set());
        prop.set(20.0, &mut cx);
        assert_eq!(prop.get(&mut cx), 20.0);
        prop.unset(&mut cx);
        assert_eq!(prop.get(&mut cx), 18.0);
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn theme_value_is_cached_until_unset() {
        let id = owner();
        let first = ThemeEngine::new().with("k", ThemeValue::Number(18.0));
        let second = ThemeEngine::new().with("k", ThemeValue::Number(99.0));
        let mut pending = Vec::new();
        let mut prop = UiProperty::new(12.0_f32, Invalidates::Visuals).themed("k");

        assert_eq!(prop.get(&mut PropertyCx::new(id, &first, &mut pending)), 18.0);
        assert_eq!(prop.get(&mut PropertyCx::new(id, &second, &mut pending)), 18.0);
        assert!(!prop.is_set());

        prop.unset(&mut PropertyCx::new(id, &second, &mut pending));
        assert!(pending.is_empty());
        assert_eq!(prop.get(&mut PropertyCx::new(id, &second, &mut pending)), 99.0);
    }

    #[test]
    fn getter_read_marks_the_property_set() {
        let id = owner();
        let theme = ThemeEngine::new();
        let mut pending = Vec::new();
        let fired = Rc::new(RefCell::new(0));
        let counter = fired.clone();
        let mut prop = UiProperty::new(5_i32, Invalidates::ParentLayout)
            .with_getter(|value| value * 2)
            .on_change(move |_, _, _| *counter.borrow_mut() += 1);

        let mut cx = PropertyCx::new(id, &theme, &mut pending);
        assert_eq!(prop.get(&mut cx), 10);
        assert!(prop.is_set());
        assert_eq!(prop.get(&mut cx), 10);
        assert_eq!(*fired.borrow(), 1);
        assert_eq!(pending, vec![(id, Invalidates::ParentLayout)]);
    }

    #[test]
    fn setter_override_transforms_input() {
        let id = owner();
        let theme = ThemeEngine::new();
        let mut pending = Vec::new();
        let mut prop = UiProperty::new(0.0_f32, Invalidates::None).with_setter(|v: f32| v.max(0.0));
        let mut cx = PropertyCx::new(id, &theme, &mut pending);
        prop.set(-4.0, &mut cx);
        assert_eq!(*prop.peek(), 0.0);
        assert!(pending.is_empty());
    }
}
