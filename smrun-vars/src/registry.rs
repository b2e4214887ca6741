//! The variable registry contract and the in-process implementation.

use crate::error::VarError;
use crate::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Opaque handle to a registry variable. Handle 0 is never assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarHandle(pub u32);

impl VarHandle {
    /// The handle returned when a name lookup fails.
    pub const INVALID: VarHandle = VarHandle(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for VarHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The registry contract: named typed variables with modification
/// notifications. A modification to a subscribed variable invokes the
/// registry's notifier with the variable's handle.
pub trait VarRegistry: Send + Sync {
    /// Looks up a variable by name.
    fn find(&self, name: &str) -> Option<VarHandle>;

    /// Reads a variable's current value.
    fn get(&self, handle: VarHandle) -> Result<Value, VarError>;

    /// Writes a variable, converting the value to the variable's declared
    /// type.
    fn set(&self, handle: VarHandle, value: Value) -> Result<(), VarError>;

    /// Registers interest in modifications to a variable. Idempotent:
    /// subscribing twice still delivers one notification per write.
    fn subscribe(&self, handle: VarHandle) -> Result<(), VarError>;
}

type Notifier = Arc<dyn Fn(VarHandle) + Send + Sync>;

struct Slot {
    name: String,
    value: Value,
    subscribed: bool,
}

struct Inner {
    slots: Vec<Slot>,
    by_name: HashMap<String, VarHandle>,
    notifier: Option<Notifier>,
    open: bool,
}

/// In-process variable registry.
///
/// Variables are defined up front with [`MemoryVars::define`]; the engine
/// wires a notifier that turns writes to subscribed variables into events.
pub struct MemoryVars {
    inner: Mutex<Inner>,
}

impl MemoryVars {
    /// Opens a fresh, empty registry.
    pub fn open() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                slots: Vec::new(),
                by_name: HashMap::new(),
                notifier: None,
                open: true,
            }),
        })
    }

    /// Closes the registry. Subsequent reads and writes fail and no further
    /// notifications are delivered.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.open = false;
        inner.notifier = None;
    }

    /// Creates a variable with an initial value, returning its handle.
    /// Defining an existing name overwrites its value and keeps the handle.
    pub fn define(&self, name: &str, value: Value) -> VarHandle {
        let mut inner = self.inner.lock();
        if let Some(&handle) = inner.by_name.get(name) {
            inner.slots[handle.0 as usize - 1].value = value;
            return handle;
        }
        inner.slots.push(Slot {
            name: name.to_string(),
            value,
            subscribed: false,
        });
        let handle = VarHandle(inner.slots.len() as u32);
        inner.by_name.insert(name.to_string(), handle);
        handle
    }

    /// Installs the callback invoked with a variable's handle whenever a
    /// subscribed variable is written.
    pub fn set_notifier(&self, notifier: impl Fn(VarHandle) + Send + Sync + 'static) {
        self.inner.lock().notifier = Some(Arc::new(notifier));
    }

    /// Whether a modification subscription exists for the handle.
    pub fn is_subscribed(&self, handle: VarHandle) -> bool {
        let inner = self.inner.lock();
        slot_index(&inner, handle)
            .map(|i| inner.slots[i].subscribed)
            .unwrap_or(false)
    }

    /// Name of the variable behind a handle.
    pub fn name_of(&self, handle: VarHandle) -> Option<String> {
        let inner = self.inner.lock();
        slot_index(&inner, handle).map(|i| inner.slots[i].name.clone())
    }
}

fn slot_index(inner: &Inner, handle: VarHandle) -> Option<usize> {
    if handle.is_valid() && (handle.0 as usize) <= inner.slots.len() {
        Some(handle.0 as usize - 1)
    } else {
        None
    }
}

impl VarRegistry for MemoryVars {
    fn find(&self, name: &str) -> Option<VarHandle> {
        let inner = self.inner.lock();
        inner.by_name.get(name).copied()
    }

    fn get(&self, handle: VarHandle) -> Result<Value, VarError> {
        let inner = self.inner.lock();
        if !inner.open {
            return Err(VarError::Closed);
        }
        let i = slot_index(&inner, handle).ok_or(VarError::HandleNotFound(handle))?;
        Ok(inner.slots[i].value.clone())
    }

    fn set(&self, handle: VarHandle, value: Value) -> Result<(), VarError> {
        let notify = {
            let mut inner = self.inner.lock();
            if !inner.open {
                return Err(VarError::Closed);
            }
            let i = slot_index(&inner, handle).ok_or(VarError::HandleNotFound(handle))?;
            let converted = value.convert_to(inner.slots[i].value.ty())?;
            tracing::trace!(name = %inner.slots[i].name, value = %converted, "variable write");
            inner.slots[i].value = converted;
            if inner.slots[i].subscribed {
                inner.notifier.clone()
            } else {
                None
            }
        };

        // Deliver outside the lock so a notifier may re-enter the registry.
        if let Some(notify) = notify {
            notify(handle);
        }
        Ok(())
    }

    fn subscribe(&self, handle: VarHandle) -> Result<(), VarError> {
        let mut inner = self.inner.lock();
        if !inner.open {
            return Err(VarError::Closed);
        }
        let i = slot_index(&inner, handle).ok_or(VarError::HandleNotFound(handle))?;
        inner.slots[i].subscribed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::VarType;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_define_and_find() {
        let vars = MemoryVars::open();
        let h = vars.define("/sys/test/a", Value::Int(0));

        assert!(h.is_valid());
        assert_eq!(vars.find("/sys/test/a"), Some(h));
        assert_eq!(vars.find("/sys/test/missing"), None);
    }

    #[test]
    fn test_redefine_keeps_handle() {
        let vars = MemoryVars::open();
        let h1 = vars.define("/a", Value::Int(1));
        let h2 = vars.define("/a", Value::Int(2));

        assert_eq!(h1, h2);
        assert_eq!(vars.get(h1).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_set_converts_to_declared_type() {
        let vars = MemoryVars::open();
        let h = vars.define("/a", Value::Short(0));

        vars.set(h, Value::Int(300)).unwrap();
        assert_eq!(vars.get(h).unwrap(), Value::Short(300));

        vars.set(h, Value::Float(2.7)).unwrap();
        assert_eq!(vars.get(h).unwrap(), Value::Short(2));
    }

    #[test]
    fn test_unknown_handle() {
        let vars = MemoryVars::open();
        assert!(matches!(
            vars.get(VarHandle(99)),
            Err(VarError::HandleNotFound(_))
        ));
        assert!(matches!(
            vars.get(VarHandle::INVALID),
            Err(VarError::HandleNotFound(_))
        ));
    }

    #[test]
    fn test_notifications_only_for_subscribed() {
        let vars = MemoryVars::open();
        let a = vars.define("/a", Value::Int(0));
        let b = vars.define("/b", Value::Int(0));

        let count = Arc::new(AtomicU32::new(0));
        let seen = count.clone();
        vars.set_notifier(move |h| {
            assert_eq!(h.0, 1);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        vars.subscribe(a).unwrap();
        vars.set(a, Value::Int(1)).unwrap();
        vars.set(b, Value::Int(1)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let vars = MemoryVars::open();
        let a = vars.define("/a", Value::Int(0));

        let count = Arc::new(AtomicU32::new(0));
        let seen = count.clone();
        vars.set_notifier(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        vars.subscribe(a).unwrap();
        vars.subscribe(a).unwrap();
        vars.set(a, Value::Int(1)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_closed_registry_rejects_access() {
        let vars = MemoryVars::open();
        let a = vars.define("/a", Value::Int(0));

        vars.close();
        assert!(matches!(vars.get(a), Err(VarError::Closed)));
        assert!(matches!(vars.set(a, Value::Int(1)), Err(VarError::Closed)));
    }

    #[test]
    fn test_default_type_tags() {
        let vars = MemoryVars::open();
        let h = vars.define("/f", VarType::Float.default_value());
        assert_eq!(vars.get(h).unwrap(), Value::Float(0.0));
    }
}
