#![allow(dead_code)]

use hushnote_core::storage::StorageResult;
use hushnote_core::{AuthError, AuthPolicy, AuthReason, Authenticator, MemoryStorage, Storage};
use std::cell::{Cell, RefCell};
use std::io::Error;

/// Authenticator returning queued outcomes, recording every prompt.
pub struct ScriptedAuthenticator {
    capable: bool,
    outcomes: RefCell<Vec<Result<(), AuthError>>>,
    prompts: RefCell<Vec<AuthReason>>,
}

impl ScriptedAuthenticator {
    pub fn succeeding() -> Self {
        Self::with_outcomes(vec![Ok(()); 8])
    }

    pub fn failing(error: AuthError) -> Self {
        Self::with_outcomes(vec![Err(error)])
    }

    pub fn incapable() -> Self {
        Self {
            capable: false,
            outcomes: RefCell::new(Vec::new()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn with_outcomes(mut outcomes: Vec<Result<(), AuthError>>) -> Self {
        outcomes.reverse();
        Self {
            capable: true,
            outcomes: RefCell::new(outcomes),
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<AuthReason> {
        self.prompts.borrow().clone()
    }
}

impl Authenticator for ScriptedAuthenticator {
    fn can_evaluate(&self, _policy: AuthPolicy) -> bool {
        self.capable
    }

    fn evaluate(&self, _policy: AuthPolicy, reason: AuthReason) -> Result<(), AuthError> {
        self.prompts.borrow_mut().push(reason);
        self.outcomes
            .borrow_mut()
            .pop()
            .unwrap_or(Err(AuthError::Other("script exhausted".to_string())))
    }
}

/// Memory storage whose writes can be switched to fail.
#[derive(Clone, Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    fail_writes: std::rc::Rc<Cell<bool>>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.set(failing);
    }

    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }
}

impl Storage for FlakyStorage {
    fn read_all(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.read_all(name)
    }

    fn write_all(&self, name: &str, bytes: &[u8]) -> StorageResult<()> {
        if self.fail_writes.get() {
            return Err(Error::other("disk full").into());
        }
        self.inner.write_all(name, bytes)
    }
}

/// Clock returning increasing values so date order is deterministic.
pub fn ticking_clock() -> i64 {
    thread_local! {
        static NOW: Cell<i64> = const { Cell::new(1_700_000_000_000) };
    }
    NOW.with(|now| {
        let value = now.get() + 1;
        now.set(value);
        value
    })
}
