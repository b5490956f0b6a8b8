//! Terms (semesters), the root of the course aggregate.

use coursehub_types::{CourseId, TermId, TermName};
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::entities::Course;
use crate::error::DbError;
use crate::serializable::{Reader, Serializable, Writer};

/// A term and the courses it owns.
///
/// `term_name` is `None` for new terms and for stored rows whose name
/// could not be parsed at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Term {
    id: TermId,
    term_name: Option<TermName>,
    display_name: String,
    courses: Vec<Course>,
    removed_courses: Vec<CourseId>,
}

impl Term {
    /// Factory and relation name.
    pub const TYPE_NAME: &'static str = "Term";
    /// Table holding term rows.
    pub const TABLE: &'static str = "terms";

    /// A new, unpersisted term.
    pub fn new(term_name: TermName, display_name: impl Into<String>) -> Self {
        Self {
            term_name: Some(term_name),
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    /// Storage identity.
    pub const fn id(&self) -> TermId {
        self.id
    }

    /// Canonical name, e.g. `WS2024/25`.
    pub const fn term_name(&self) -> Option<&TermName> {
        self.term_name.as_ref()
    }

    /// Replace the canonical name.
    pub fn set_term_name(&mut self, term_name: Option<TermName>) {
        self.term_name = term_name;
    }

    /// Free-text label shown in the UI.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Replace the label.
    pub fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.display_name = display_name.into();
    }

    /// Courses of this term, ordered by id for loaded terms.
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// Take ownership of `course`, pointing its foreign key at this term.
    pub fn add_course(&mut self, mut course: Course) {
        course.set_term_id(self.id);
        self.courses.push(course);
    }

    /// Detach the course with `id`. It and its projects are deleted on the
    /// next write.
    pub fn remove_course(&mut self, id: CourseId) -> Option<Course> {
        let index = self.courses.iter().position(|c| c.id() == id)?;
        let course = self.courses.remove(index);
        if !id.is_unset() {
            self.removed_courses.push(id);
        }
        Some(course)
    }

    /// Look up a course by id.
    pub fn find_course_by_id(&self, id: CourseId) -> Option<&Course> {
        self.courses.iter().find(|c| c.id() == id)
    }

    /// Look up a course by id for modification.
    pub fn find_course_by_id_mut(&mut self, id: CourseId) -> Option<&mut Course> {
        self.courses.iter_mut().find(|c| c.id() == id)
    }

    pub(crate) fn courses_mut(&mut self) -> &mut [Course] {
        &mut self.courses
    }

    pub(crate) fn removed_courses(&self) -> &[CourseId] {
        &self.removed_courses
    }

    pub(crate) fn take_removed_courses(&mut self) -> Vec<CourseId> {
        std::mem::take(&mut self.removed_courses)
    }
}

impl Serializable for Term {
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
        self.id = TermId::new(id);
    }

    fn read_from<'a>(&'a mut self, reader: &'a mut dyn Reader) -> BoxFuture<'a, Result<(), DbError>> {
        async move {
            self.term_name = reader.read_term_name("termName")?;
            self.display_name = reader.read_string("displayName")?.unwrap_or_default();
            self.courses = reader
                .read_objects(Course::TERM_FK, Course::TYPE_NAME)
                .await?
                .into_iter()
                .map(Course::try_from)
                .collect::<Result<_, _>>()?;
            self.removed_courses.clear();
            Ok(())
        }
        .boxed()
    }

    fn write_to(&self, writer: &mut dyn Writer) {
        let term_name = self.term_name.as_ref().map(ToString::to_string);
        writer.write_string("termName", term_name.as_deref());
        writer.write_string("displayName", Some(&self.display_name));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::serializable::RowWriter;
    use crate::value::Value;

    use super::*;

    #[test]
    fn writes_canonical_name_and_no_children() {
        let mut term = Term::new(TermName::parse("winter 24/25").unwrap(), "Winter 2024");
        term.add_course(Course::new("Compilers"));

        let mut writer = RowWriter::new();
        term.write_to(&mut writer);
        let row = writer.into_row();

        assert_eq!(row.get("termName"), Some(&Value::from("WS2024/25")));
        assert_eq!(row.get("displayName"), Some(&Value::from("Winter 2024")));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn null_term_name_is_written_as_typed_null() {
        let term = Term::default();
        let mut writer = RowWriter::new();
        term.write_to(&mut writer);
        assert_eq!(writer.into_row().get("termName"), Some(&Value::Text(None)));
    }

    #[test]
    fn composition_methods_manage_courses() {
        let mut term = Term::default();
        term.set_id(5);
        let mut stored = Course::new("Databases");
        stored.set_id(8);
        term.add_course(stored);

        let found = term.find_course_by_id(CourseId::new(8)).unwrap();
        assert_eq!(found.term_id(), TermId::new(5));

        term.find_course_by_id_mut(CourseId::new(8))
            .unwrap()
            .set_course_name("Database Systems");
        assert_eq!(term.courses().first().unwrap().course_name(), "Database Systems");

        assert!(term.remove_course(CourseId::new(99)).is_none());
        assert!(term.remove_course(CourseId::new(8)).is_some());
        assert_eq!(term.removed_courses(), [CourseId::new(8)]);
    }
}
