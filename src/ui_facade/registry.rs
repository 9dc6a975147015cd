/*
 * The per-thread handle registry: the authoritative map from a live native
 * handle to the wrapper that owns it.
 *
 * Each UI thread owns its own table, so a handle bound on one thread is
 * invisible to every other. The table keeps a strong reference to the wrapper
 * until the final destroy notification removes the association; the platform
 * can therefore never deliver a message to a wrapper that has been dropped.
 *
 * The `RefCell` borrow is confined to each function body. Nothing here calls
 * back into a handler, so a handler may add or remove associations while an
 * outer dispatch is on the stack.
 */

use crate::platform_layer::error::{FacadeError, Result as FacadeResult};
use crate::platform_layer::types::Handle;
use crate::ui_facade::window::WindowRef;

use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static ASSOCIATIONS: RefCell<HashMap<Handle, WindowRef>> = RefCell::new(HashMap::new());
}

pub struct HandleRegistry;

impl HandleRegistry {
    pub fn add(handle: Handle, object: WindowRef) -> FacadeResult<()> {
        let rejected = ASSOCIATIONS.with(|map| {
            let mut map = map.borrow_mut();
            if map.contains_key(&handle) {
                Some(object)
            } else {
                map.insert(handle, object);
                None
            }
        });
        // The rejected reference is dropped here, outside the borrow.
        match rejected {
            Some(_) => {
                log::error!("HandleRegistry: {handle:?} already has a live association.");
                Err(FacadeError::DuplicateHandle(handle))
            }
            None => {
                log::trace!("HandleRegistry: Added association for {handle:?}.");
                Ok(())
            }
        }
    }

    /// Drops the association and clears the wrapper's handle if it still names `handle`.
    pub fn remove(handle: Handle) -> FacadeResult<WindowRef> {
        let removed = ASSOCIATIONS.with(|map| map.borrow_mut().remove(&handle));
        match removed {
            Some(object) => {
                if object.object().handle() == Some(handle) {
                    object.object().unbind();
                }
                log::trace!("HandleRegistry: Removed association for {handle:?}.");
                Ok(object)
            }
            None => {
                log::error!("HandleRegistry: No association to remove for {handle:?}.");
                Err(FacadeError::NotRegistered(format!("{handle:?}")))
            }
        }
    }

    /// Removes whichever association refers to `object`.
    pub fn remove_object(object: &WindowRef) -> FacadeResult<Handle> {
        let found = ASSOCIATIONS.with(|map| {
            map.borrow()
                .iter()
                .find(|(_, candidate)| candidate.ptr_eq(object))
                .map(|(handle, _)| *handle)
        });
        match found {
            Some(handle) => Self::remove(handle).map(|_| handle),
            None => {
                log::error!("HandleRegistry: {object:?} has no association to remove.");
                Err(FacadeError::NotRegistered(format!("{object:?}")))
            }
        }
    }

    pub fn find(handle: Handle) -> Option<WindowRef> {
        ASSOCIATIONS.with(|map| map.borrow().get(&handle).cloned())
    }

    pub fn contains(handle: Handle) -> bool {
        ASSOCIATIONS.with(|map| map.borrow().contains_key(&handle))
    }

    pub fn len() -> usize {
        ASSOCIATIONS.with(|map| map.borrow().len())
    }

    pub fn is_empty() -> bool {
        Self::len() == 0
    }

    pub fn handles() -> Vec<Handle> {
        ASSOCIATIONS.with(|map| map.borrow().keys().copied().collect())
    }
}

/*
 * Adds the association and stores the handle in the wrapper. A wrapper that is
 * still bound to another live window is refused.
 */
pub(crate) fn attach(object: &WindowRef, handle: Handle) -> FacadeResult<()> {
    if let Some(current) = object.object().handle() {
        if current != handle && HandleRegistry::contains(current) {
            log::error!(
                "HandleRegistry: Refusing to bind {handle:?}; the wrapper is still bound to {current:?}."
            );
            return Err(FacadeError::OperationFailed(format!(
                "wrapper already bound to {current:?}"
            )));
        }
    }
    HandleRegistry::add(handle, object.clone())?;
    object.object().bind(handle);
    Ok(())
}

/// Removes the association and clears the wrapper's handle slot.
pub(crate) fn detach(handle: Handle) -> FacadeResult<WindowRef> {
    HandleRegistry::remove(handle)
}
