//! Courses, owned by a term and owning their projects.

use coursehub_types::{CourseId, ProjectId, TermId};
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::entities::Project;
use crate::error::DbError;
use crate::serializable::{Reader, Serializable, Writer};

/// A course within a term.
///
/// Projects are added and removed only through the course. Removing a
/// persisted project remembers its id so the next write deletes the row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    term_id: TermId,
    course_name: String,
    students_can_create_project: bool,
    projects: Vec<Project>,
    removed_projects: Vec<ProjectId>,
}

impl Course {
    /// Factory and relation name.
    pub const TYPE_NAME: &'static str = "Course";
    /// Table holding course rows.
    pub const TABLE: &'static str = "courses";
    /// Foreign-key column pointing at the owning term.
    pub const TERM_FK: &'static str = "termId";

    /// A new, unpersisted course.
    pub fn new(course_name: impl Into<String>) -> Self {
        Self {
            course_name: course_name.into(),
            ..Self::default()
        }
    }

    /// Storage identity.
    pub const fn id(&self) -> CourseId {
        self.id
    }

    /// Owning term.
    pub const fn term_id(&self) -> TermId {
        self.term_id
    }

    /// Attach to an already stored term, for writing this course on its own.
    pub const fn set_term_id(&mut self, term_id: TermId) {
        self.term_id = term_id;
    }

    /// Display name.
    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    /// Rename the course.
    pub fn set_course_name(&mut self, name: impl Into<String>) {
        self.course_name = name.into();
    }

    /// Whether students may create projects in this course.
    pub const fn students_can_create_project(&self) -> bool {
        self.students_can_create_project
    }

    /// Allow or forbid students to create projects.
    pub const fn set_students_can_create_project(&mut self, allowed: bool) {
        self.students_can_create_project = allowed;
    }

    /// Projects of this course, ordered by id for loaded courses.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Take ownership of `project`, pointing its foreign key at this course.
    pub fn add_project(&mut self, mut project: Project) {
        project.set_course_id(self.id);
        self.projects.push(project);
    }

    /// Detach the project with `id`. It is deleted on the next write.
    pub fn remove_project(&mut self, id: ProjectId) -> Option<Project> {
        let index = self.projects.iter().position(|p| p.id() == id)?;
        let project = self.projects.remove(index);
        if !id.is_unset() {
            self.removed_projects.push(id);
        }
        Some(project)
    }

    /// Look up a project by id.
    pub fn find_project_by_id(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id() == id)
    }

    /// Look up a project by id for modification.
    pub fn find_project_by_id_mut(&mut self, id: ProjectId) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id() == id)
    }

    pub(crate) fn projects_mut(&mut self) -> &mut [Project] {
        &mut self.projects
    }

    pub(crate) fn removed_projects(&self) -> &[ProjectId] {
        &self.removed_projects
    }

    pub(crate) fn take_removed_projects(&mut self) -> Vec<ProjectId> {
        std::mem::take(&mut self.removed_projects)
    }
}

impl Serializable for Course {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn table(&self) -> &'static str {
        Self::TABLE
    }

    fn id(&self) -> i64 {
        self.id.into_inner()
    }

    fn set_id(&mut self, id: i64) {
        self.id = CourseId::new(id);
    }

    fn read_from<'a>(&'a mut self, reader: &'a mut dyn Reader) -> BoxFuture<'a, Result<(), DbError>> {
        async move {
            self.term_id = TermId::new(reader.read_number(Self::TERM_FK)?.unwrap_or_default());
            self.course_name = reader.read_string("courseName")?.unwrap_or_default();
            self.students_can_create_project =
                reader.read_bool("studentsCanCreateProject")?.unwrap_or_default();
            self.projects = reader
                .read_objects(Project::COURSE_FK, Project::TYPE_NAME)
                .await?
                .into_iter()
                .map(Project::try_from)
                .collect::<Result<_, _>>()?;
            self.removed_projects.clear();
            Ok(())
        }
        .boxed()
    }

    fn write_to(&self, writer: &mut dyn Writer) {
        writer.write_string("courseName", Some(&self.course_name));
        writer.write_number(Self::TERM_FK, Some(self.term_id.into_inner()));
        writer.write_bool("studentsCanCreateProject", Some(self.students_can_create_project));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn add_project_points_foreign_key_at_course() {
        let mut course = Course::new("Compilers");
        course.set_id(12);
        course.add_project(Project::new("Parser"));
        assert_eq!(course.projects().first().unwrap().course_id(), CourseId::new(12));
    }

    #[test]
    fn removing_persisted_project_is_remembered() {
        let mut course = Course::new("Compilers");
        let mut stored = Project::new("Parser");
        stored.set_id(3);
        course.add_project(stored);
        course.add_project(Project::new("Draft"));

        let removed = course.remove_project(ProjectId::new(3)).unwrap();
        assert_eq!(removed.project_name(), "Parser");
        assert_eq!(course.removed_projects(), [ProjectId::new(3)]);
        assert!(course.find_project_by_id(ProjectId::new(3)).is_none());

        // Unpersisted projects leave nothing to delete.
        course.remove_project(ProjectId::UNSET).unwrap();
        assert_eq!(course.removed_projects().len(), 1);
        assert!(course.projects().is_empty());
    }
}
