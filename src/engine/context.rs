//! The per-execution environment shared by every element of a run.

use std::any::Any;
use std::collections::hash_map::Entry as SlotEntry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{DarkroomError, Result};

/// Shared flag checked between pipeline steps. Setting it stops the run
/// before the next element starts.
pub type CancellationToken = Arc<AtomicBool>;

/// Initialisation callback run once against the store of every new Context.
pub type ContextHook = Arc<dyn Fn(&mut Extensions) + Send + Sync>;

/// How the current execution was started. Elements may gate on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Batch conversion of many inputs.
    Convert,
    /// A single scripted run.
    Script,
    /// Interactive editing, re-running the same decoded script.
    Edit,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Convert => "convert",
            Mode::Script => "script",
            Mode::Edit => "edit",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "convert" => Ok(Mode::Convert),
            "script" => Ok(Mode::Script),
            "edit" => Ok(Mode::Edit),
            other => Err(format!(
                "unknown mode '{}' (expected convert, script or edit)",
                other
            )),
        }
    }
}

/// String-keyed store of typed per-execution resources.
#[derive(Default)]
pub struct Extensions {
    slots: HashMap<String, Box<dyn Any + Send>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing whatever the slot held.
    pub fn insert<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
        self.slots.insert(key.into(), Box::new(value));
    }

    /// Typed read access; `None` if the slot is empty or holds another type.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.slots.get(key).and_then(|slot| slot.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.slots
            .get_mut(key)
            .and_then(|slot| slot.downcast_mut::<T>())
    }

    /// Typed access, filling the slot first if it is empty or holds another type.
    pub fn get_or_insert_with<T: Any + Send>(
        &mut self,
        key: impl Into<String>,
        init: impl FnOnce() -> T,
    ) -> &mut T {
        let slot = match self.slots.entry(key.into()) {
            SlotEntry::Occupied(mut occupied) => {
                if !occupied.get().is::<T>() {
                    occupied.insert(Box::new(init()));
                }
                occupied.into_mut()
            }
            SlotEntry::Vacant(vacant) => vacant.insert(Box::new(init())),
        };
        slot.downcast_mut::<T>()
            .unwrap_or_else(|| unreachable!("slot type checked above"))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.slots.remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(|k| k.as_str())
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("Extensions").field("keys", &keys).finish()
    }
}

/// Execution environment for one top-level run.
///
/// Created once per execution and dropped at its end; anything an element
/// wants to keep between steps of the same run lives in [`Extensions`].
#[derive(Debug)]
pub struct Context {
    mode: Mode,
    verbose: bool,
    cancel: CancellationToken,
    extensions: Extensions,
    /// Named pipelines currently executing, innermost last.
    pipelines: Vec<String>,
}

impl Context {
    /// Create a context, seeding its store with every hook exactly once.
    pub fn new(mode: Mode, hooks: &[ContextHook]) -> Self {
        let mut extensions = Extensions::new();
        for hook in hooks {
            hook(&mut extensions);
        }
        Self {
            mode,
            verbose: false,
            cancel: CancellationToken::default(),
            extensions,
            pipelines: Vec::new(),
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Share an externally owned cancellation flag.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation has been requested.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(DarkroomError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub fn enter_pipeline(&mut self, name: &str) {
        self.pipelines.push(name.to_string());
    }

    pub fn leave_pipeline(&mut self) {
        self.pipelines.pop();
    }

    /// The innermost named pipeline being executed, if any.
    pub fn current_pipeline(&self) -> Option<&str> {
        self.pipelines.last().map(|s| s.as_str())
    }
}
