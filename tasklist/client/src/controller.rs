//! Optimistic task list controller.
//!
//! Toggles and edits change the local mirror before the store has answered and
//! undo themselves when it refuses. Additions and deletions wait for the store,
//! since there is no local record to roll back to (additions) or the change is
//! destructive (deletions).
use crate::api::{ApiError, TaskApi};
use crate::notify::{ConfirmationGate, Notification, Notifier, messages};
use chrono::Utc;
use tasklist_core::{Filter, Stats, Task, TaskId};

/// Result of one controller operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    /// The change reached the store and stands locally.
    Applied,
    /// Nothing was sent: the input was empty, unchanged, unknown or not confirmed.
    Skipped,
    /// The store refused or could not be reached; local state was restored.
    Failed(ApiError),
}

/// One user session over the task list.
pub struct TaskClient<A: TaskApi, N: Notifier> {
    api: A,
    notifier: N,
    tasks: Vec<Task>,
    filter: Filter,
    input: String,
    last_issued_id: Option<TaskId>,
}

impl<A: TaskApi, N: Notifier> TaskClient<A, N> {
    pub fn new(api: A, notifier: N) -> Self {
        Self {
            api,
            notifier,
            tasks: Vec::new(),
            filter: Filter::default(),
            input: String::new(),
            last_issued_id: None,
        }
    }

    /// The full local mirror, unfiltered.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Changes which tasks are shown. Never reaches the store.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    /// Tasks matching the current filter, in mirror order.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| self.filter.matches(task))
            .collect()
    }

    pub fn stats(&self) -> Stats {
        Stats::of(&self.tasks)
    }

    /// Replaces the mirror with the store's collection. A failed load keeps the
    /// previous mirror.
    #[tracing::instrument(skip(self))]
    pub async fn load(&mut self) -> Outcome {
        match self.api.list().await {
            Ok(tasks) => {
                tracing::debug!(count = tasks.len(), "Loaded tasks");
                self.tasks = tasks;
                Outcome::Applied
            }
            Err(error) => self.fail(error, messages::LOAD_FAILED),
        }
    }

    /// Submits the current input as a new task.
    #[tracing::instrument(skip(self), fields(input = %self.input))]
    pub async fn add_task(&mut self) -> Outcome {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            self.notifier
                .notify(&Notification::warning(messages::EMPTY_INPUT));
            return Outcome::Skipped;
        }

        let now = Utc::now();
        let candidate = Task::new(self.issue_id(TaskId::from_clock(now)), text, now);
        match self.api.create(&candidate).await {
            Ok(stored) => {
                self.tasks.push(stored);
                self.input.clear();
                self.notifier
                    .notify(&Notification::success(messages::TASK_ADDED));
                Outcome::Applied
            }
            Err(error) => self.fail(error, messages::ADD_FAILED),
        }
    }

    /// Flips a task between completed and pending.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_completed(&mut self, id: TaskId) -> Outcome {
        let Some(index) = self.position(id) else {
            return Outcome::Skipped;
        };

        self.tasks[index].completed = !self.tasks[index].completed;
        match self.api.update(id, &self.tasks[index]).await {
            Ok(_) => {
                let message = if self.tasks[index].completed {
                    messages::TASK_COMPLETED
                } else {
                    messages::TASK_PENDING
                };
                self.notifier.notify(&Notification::success(message));
                Outcome::Applied
            }
            Err(error) => {
                self.tasks[index].completed = !self.tasks[index].completed;
                self.fail(error, messages::UPDATE_FAILED)
            }
        }
    }

    /// Replaces a task's text. Blank or unchanged text is dropped without a request.
    #[tracing::instrument(skip(self))]
    pub async fn edit_text(&mut self, id: TaskId, new_text: &str) -> Outcome {
        let new_text = new_text.trim();
        let Some(index) = self.position(id) else {
            return Outcome::Skipped;
        };
        if new_text.is_empty() || new_text == self.tasks[index].text {
            return Outcome::Skipped;
        }

        let previous = std::mem::replace(&mut self.tasks[index].text, new_text.to_string());
        match self.api.update(id, &self.tasks[index]).await {
            Ok(_) => {
                self.notifier
                    .notify(&Notification::success(messages::TASK_EDITED));
                Outcome::Applied
            }
            Err(error) => {
                self.tasks[index].text = previous;
                self.fail(error, messages::UPDATE_FAILED)
            }
        }
    }

    /// Deletes a task once the user confirms. The mirror only changes after the
    /// store has deleted it.
    #[tracing::instrument(skip(self, gate))]
    pub async fn delete_task<G: ConfirmationGate>(&mut self, id: TaskId, gate: &G) -> Outcome {
        if !gate.confirm(messages::DELETE_PROMPT) {
            self.notifier
                .notify(&Notification::info(messages::DELETE_CANCELLED));
            return Outcome::Skipped;
        }

        match self.api.delete(id).await {
            Ok(()) => {
                self.tasks.retain(|task| task.id != id);
                self.notifier
                    .notify(&Notification::success(messages::TASK_DELETED));
                Outcome::Applied
            }
            Err(error) => self.fail(error, messages::DELETE_FAILED),
        }
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    /// Hands out clock-derived ids that keep increasing within the session,
    /// even when two tasks are added within the same millisecond.
    fn issue_id(&mut self, candidate: TaskId) -> TaskId {
        let id = match self.last_issued_id {
            Some(last) if candidate <= last => last.successor().unwrap_or(candidate),
            _ => candidate,
        };
        self.last_issued_id = Some(id);
        id
    }

    fn fail(&self, error: ApiError, rejected_message: &str) -> Outcome {
        tracing::warn!("Task request failed: {}", error);
        let message = match error {
            ApiError::Rejected(_) => rejected_message,
            ApiError::Transport(_) => messages::CONNECTION_ERROR,
        };
        self.notifier.notify(&Notification::error(message));
        Outcome::Failed(error)
    }
}
