// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recording doubles for the bridge seams, shared by the unit tests.

use std::cell::RefCell;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chatshell_core::error::{Result, ShellError};
use chatshell_core::types::{NotificationOptions, NotificationRequest};

use crate::traits::{AuthorizationCallback, EventSink, NotificationCenter, ScriptHost, ShellEvent};

/// How the fake OS answers an authorization request.
#[derive(Debug, Clone, Copy)]
pub enum AuthOutcome {
    Grant,
    Deny,
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CenterCall {
    Authorize(NotificationOptions),
    RegisterRemote,
    Submit(NotificationRequest),
}

pub struct RecordingCenter {
    outcome: AuthOutcome,
    fail_submit: AtomicBool,
    calls: Mutex<Vec<CenterCall>>,
}

impl RecordingCenter {
    pub fn new(outcome: AuthOutcome) -> Self {
        Self {
            outcome,
            fail_submit: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_submissions(&self) {
        self.fail_submit.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<CenterCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn submitted(&self) -> Vec<NotificationRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                CenterCall::Submit(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: CenterCall) {
        self.calls.lock().expect("calls lock poisoned").push(call);
    }
}

impl NotificationCenter for RecordingCenter {
    fn platform_name(&self) -> &str {
        "Test"
    }

    fn request_authorization(&self, options: NotificationOptions, completion: AuthorizationCallback) {
        self.record(CenterCall::Authorize(options));
        let result = match self.outcome {
            AuthOutcome::Grant => Ok(true),
            AuthOutcome::Deny => Ok(false),
            AuthOutcome::Fail => Err(ShellError::Authorization("user prompt unavailable".into())),
        };
        completion(result);
    }

    fn register_for_remote_notifications(&self) {
        self.record(CenterCall::RegisterRemote);
    }

    fn submit(&self, request: NotificationRequest) -> Result<()> {
        self.record(CenterCall::Submit(request));
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(ShellError::Notification("center rejected request".into()));
        }
        Ok(())
    }
}

/// Script host that remembers every script it was asked to run.
#[derive(Default)]
pub struct RecordingHost {
    scripts: RefCell<Vec<String>>,
    fail: bool,
}

impl RecordingHost {
    pub fn failing() -> Self {
        Self {
            scripts: RefCell::default(),
            fail: true,
        }
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.borrow().clone()
    }
}

impl ScriptHost for RecordingHost {
    fn evaluate_script(&self, script: &str) -> Result<()> {
        self.scripts.borrow_mut().push(script.to_owned());
        if self.fail {
            return Err(ShellError::Script("page not loaded".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ShellEvent>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<ShellEvent> {
        std::mem::take(&mut *self.events.lock().expect("events lock poisoned"))
    }
}

impl EventSink for RecordingSink {
    fn post(&self, event: ShellEvent) {
        self.events.lock().expect("events lock poisoned").push(event);
    }
}
