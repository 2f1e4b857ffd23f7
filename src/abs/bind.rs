//! Scoped binding of device objects.
//!
//! OpenGL objects are bound into global slots, so anything bound stays bound
//! until someone unbinds it. [`Bindable::bind`] returns a [`Bound`] guard that
//! unbinds when it goes out of scope, including on early `?` returns.

use std::ops::Deref;

/// A device object that can be made current for subsequent GL calls.
pub trait Bindable {
    /// Makes this object current. Prefer [`Bindable::bind`].
    fn bind_raw(&self);

    /// Clears the slot this object was bound into.
    fn unbind_raw(&self);

    /// Binds the object and returns a guard that unbinds it on drop.
    fn bind(&self) -> Bound<'_, Self>
    where
        Self: Sized,
    {
        self.bind_raw();
        Bound { target: self }
    }
}

/// Guard for a bound object. Operations that are only valid while the object
/// is bound are implemented on this type.
pub struct Bound<'a, T: Bindable> {
    target: &'a T,
}

impl<T: Bindable> Deref for Bound<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.target
    }
}

impl<T: Bindable> Drop for Bound<'_, T> {
    fn drop(&mut self) {
        self.target.unbind_raw();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Slot {
        log: RefCell<Vec<&'static str>>,
    }

    impl Bindable for Slot {
        fn bind_raw(&self) {
            self.log.borrow_mut().push("bind");
        }

        fn unbind_raw(&self) {
            self.log.borrow_mut().push("unbind");
        }
    }

    fn fails_while_bound(slot: &Slot) -> Result<(), ()> {
        let _bound = slot.bind();
        let upload: Result<(), ()> = Err(());
        upload?;
        slot.log.borrow_mut().push("after upload");
        Ok(())
    }

    #[test]
    fn guard_unbinds_on_drop() {
        let slot = Slot::default();
        {
            let bound = slot.bind();
            bound.log.borrow_mut().push("use");
        }
        assert_eq!(*slot.log.borrow(), ["bind", "use", "unbind"]);
    }

    #[test]
    fn guard_unbinds_on_error_path() {
        let slot = Slot::default();
        assert!(fails_while_bound(&slot).is_err());
        assert_eq!(*slot.log.borrow(), ["bind", "unbind"]);
    }
}
