use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

use crate::engine::Workspace;

/// Recycles request workspaces so steady-state requests never allocate one.
pub(crate) struct WorkspacePool {
    idle: Mutex<Vec<Workspace>>,
    workspace_bytes: usize,
    max_idle: usize,
}

impl WorkspacePool {
    #[must_use]
    pub(crate) fn new(workspace_bytes: usize, max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(max_idle)),
            workspace_bytes,
            max_idle,
        }
    }

    pub(crate) fn acquire(&self) -> PooledWorkspace<'_> {
        let workspace = self
            .idle
            .lock()
            .pop()
            .unwrap_or_else(|| Workspace::with_capacity(self.workspace_bytes));
        PooledWorkspace {
            pool: self,
            workspace,
        }
    }

    fn release(&self, workspace: Workspace) {
        if workspace.capacity() != self.workspace_bytes {
            return;
        }
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(workspace);
        }
    }

    #[must_use]
    pub(crate) fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }
}

/// Workspace on loan for one request; returned to the pool on drop.
pub struct PooledWorkspace<'p> {
    pool: &'p WorkspacePool,
    workspace: Workspace,
}

impl Deref for PooledWorkspace<'_> {
    type Target = Workspace;

    fn deref(&self) -> &Workspace {
        &self.workspace
    }
}

impl DerefMut for PooledWorkspace<'_> {
    fn deref_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }
}

impl Drop for PooledWorkspace<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.workspace));
    }
}
