//! Student projects, owned by a course.

use coursehub_types::{CourseId, ProjectId};
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::DbError;
use crate::serializable::{Reader, Serializable, Writer};

/// A project within a course.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    id: ProjectId,
    course_id: CourseId,
    project_name: String,
    students_can_join_project: bool,
}

impl Project {
    /// Factory and relation name.
    pub const TYPE_NAME: &'static str = "Project";
    /// Table holding project rows.
    pub const TABLE: &'static str = "projects";
    /// Foreign-key column pointing at the owning course.
    pub const COURSE_FK: &'static str = "courseId";

    /// A new, unpersisted project.
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            ..Self::default()
        }
    }

    /// Storage identity.
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Owning course.
    pub const fn course_id(&self) -> CourseId {
        self.course_id
    }

    /// Attach to an already stored course, for writing this project on its own.
    pub const fn set_course_id(&mut self, course_id: CourseId) {
        self.course_id = course_id;
    }

    /// Display name.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Rename the project.
    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.project_name = name.into();
    }

    /// Whether students may join this project themselves.
    pub const fn students_can_join_project(&self) -> bool {
        self.students_can_join_project
    }

    /// Allow or forbid students to join this project.
    pub const fn set_students_can_join_project(&mut self, allowed: bool) {
        self.students_can_join_project = allowed;
    }
}

impl Serializable for Project {
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
        self.id = ProjectId::new(id);
    }

    fn read_from<'a>(&'a mut self, reader: &'a mut dyn Reader) -> BoxFuture<'a, Result<(), DbError>> {
        async move {
            self.course_id = CourseId::new(reader.read_number(Self::COURSE_FK)?.unwrap_or_default());
            self.project_name = reader.read_string("projectName")?.unwrap_or_default();
            self.students_can_join_project =
                reader.read_bool("studentsCanJoinProject")?.unwrap_or_default();
            Ok(())
        }
        .boxed()
    }

    fn write_to(&self, writer: &mut dyn Writer) {
        writer.write_string("projectName", Some(&self.project_name));
        writer.write_number(Self::COURSE_FK, Some(self.course_id.into_inner()));
        writer.write_bool("studentsCanJoinProject", Some(self.students_can_join_project));
    }
}
