use std::collections::HashMap;
use std::sync::Arc;

use poise::serenity_prelude::{ChannelId, RoleId};

use crate::error::{BotError, Result};

#[derive(Debug, Clone)]
pub struct Task {
    pub id: u32,
    pub description: String,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct Project {
    pub description: Option<String>,
    pub status: String,
    pub channel_id: ChannelId,
    pub role_id: RoleId,
    pub tasks: Vec<Task>,
    pub archived: bool,
}

impl Project {
    pub fn new(description: Option<String>, channel_id: ChannelId, role_id: RoleId) -> Self {
        Self {
            description,
            status: "In Progress".to_string(),
            channel_id,
            role_id,
            tasks: Vec::new(),
            archived: false,
        }
    }
}

/// Registry of projects keyed by name. Archiving flags an entry; nothing is
/// ever removed.
#[derive(Debug, Default)]
pub struct ProjectStore {
    projects: HashMap<String, Project>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: &str, project: Project) -> Result<()> {
        if self.projects.contains_key(name) {
            return Err(BotError::ProjectExists {
                name: name.to_string(),
            });
        }
        self.projects.insert(name.to_string(), project);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Project> {
        self.projects
            .get(name)
            .cloned()
            .ok_or_else(|| BotError::ProjectNotFound {
                name: name.to_string(),
            })
    }

    /// Append a task with the next sequential ID
    pub fn add_task(&mut self, name: &str, description: String) -> Result<u32> {
        let project = self.get_mut(name)?;
        let task_id = project.tasks.len() as u32 + 1;
        project.tasks.push(Task {
            id: task_id,
            description,
            completed: false,
        });
        Ok(task_id)
    }

    pub fn complete_task(&mut self, name: &str, task_id: u32) -> Result<()> {
        let project = self.get_mut(name)?;
        let task = project
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| BotError::TaskNotFound {
                project: name.to_string(),
                task_id,
            })?;
        task.completed = true;
        Ok(())
    }

    pub fn set_description(&mut self, name: &str, value: String) -> Result<()> {
        self.get_mut(name)?.description = Some(value);
        Ok(())
    }

    pub fn set_status(&mut self, name: &str, value: String) -> Result<()> {
        self.get_mut(name)?.status = value;
        Ok(())
    }

    /// Flag a project as archived and return the updated entry so the caller
    /// can rename the Discord channel and role. Terminal: there is no
    /// unarchive.
    pub fn archive(&mut self, name: &str) -> Result<Project> {
        let project = self.get_mut(name)?;
        project.archived = true;
        project.status = "Archived".to_string();
        Ok(project.clone())
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Project> {
        self.projects
            .get_mut(name)
            .ok_or_else(|| BotError::ProjectNotFound {
                name: name.to_string(),
            })
    }
}

pub type SharedProjectStore = Arc<tokio::sync::RwLock<ProjectStore>>;

pub fn create_shared_project_store() -> SharedProjectStore {
    Arc::new(tokio::sync::RwLock::new(ProjectStore::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project::new(Some("A test project".to_string()), ChannelId::new(1), RoleId::new(2))
    }

    #[test]
    fn test_create_rejects_duplicates() {
        let mut store = ProjectStore::new();
        store.create("site", project()).unwrap();
        assert!(matches!(
            store.create("site", project()),
            Err(BotError::ProjectExists { .. })
        ));
    }

    #[test]
    fn test_task_ids_are_sequential() {
        let mut store = ProjectStore::new();
        store.create("site", project()).unwrap();

        assert_eq!(store.add_task("site", "design".to_string()).unwrap(), 1);
        assert_eq!(store.add_task("site", "build".to_string()).unwrap(), 2);
        assert_eq!(store.add_task("site", "ship".to_string()).unwrap(), 3);

        store.complete_task("site", 2).unwrap();
        let tasks = store.get("site").unwrap().tasks;
        assert!(!tasks[0].completed);
        assert!(tasks[1].completed);
    }

    #[test]
    fn test_unknown_project_is_not_found() {
        let mut store = ProjectStore::new();
        assert!(matches!(
            store.add_task("ghost", "anything".to_string()),
            Err(BotError::ProjectNotFound { .. })
        ));
        assert!(matches!(
            store.get("ghost"),
            Err(BotError::ProjectNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_task_is_not_found() {
        let mut store = ProjectStore::new();
        store.create("site", project()).unwrap();
        assert!(matches!(
            store.complete_task("site", 4),
            Err(BotError::TaskNotFound { .. })
        ));
    }

    #[test]
    fn test_archive_is_terminal_flagging() {
        let mut store = ProjectStore::new();
        store.create("site", project()).unwrap();

        let archived = store.archive("site").unwrap();
        assert!(archived.archived);
        assert_eq!(archived.status, "Archived");
        // The entry stays in the registry
        assert!(store.get("site").unwrap().archived);
    }
}
