//! Active workflow context.
//!
//! Tasks register themselves into the workflow that is active when
//! they are constructed. The active slot is thread-local: each thread
//! has at most one active workflow, entering a second one while a
//! guard is alive fails fast, and dropping the guard always clears the
//! slot, including on panic unwind.

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::core::workflow::Workflow;
use crate::error::{Error, Result};

thread_local! {
    static ACTIVE: RefCell<Option<Workflow>> = const { RefCell::new(None) };
}

/// The workflow active on this thread, if any.
pub fn current() -> Option<Workflow> {
    ACTIVE.with(|slot| slot.borrow().clone())
}

/// Scope guard marking a workflow as active for the current thread.
///
/// Returned by `Workflow::enter()`. Not `Send`: the guard must be
/// dropped on the thread that created it.
#[derive(Debug)]
pub struct WorkflowGuard {
    // !Send marker, keeps the guard on its creating thread.
    _not_send: PhantomData<*const ()>,
}

pub(crate) fn activate(workflow: &Workflow) -> Result<WorkflowGuard> {
    ACTIVE.with(|slot| {
        let mut active = slot.borrow_mut();
        if let Some(existing) = active.as_ref() {
            return Err(Error::NestedWorkflow {
                active: existing.name(),
                entering: workflow.name(),
            });
        }
        *active = Some(workflow.clone());
        Ok(WorkflowGuard {
            _not_send: PhantomData,
        })
    })
}

impl Drop for WorkflowGuard {
    fn drop(&mut self) {
        ACTIVE.with(|slot| {
            slot.borrow_mut().take();
        });
    }
}
