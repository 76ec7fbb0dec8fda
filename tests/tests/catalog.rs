use lectern_api::{CourseQuery, Error as ApiError};
use lectern_client::{
    pages::{Catalog, MyCourses},
    progress, Backend, Loadable,
};
use tests::{new_course, Fixture};

#[tokio::test]
async fn search_and_filter() {
    let f = Fixture::new();
    let mut other = new_course("Cooking basics");
    other.category = Some(String::from("kitchen"));
    f.server.admin_create_course(f.instructor, other);

    let mut catalog = Catalog::new(f.anonymous(), CourseQuery::default());
    assert_eq!(catalog.load().await.ready().unwrap().count, 2);

    let page = catalog
        .set_query(CourseQuery {
            search: Some(String::from("RUST")),
            ..CourseQuery::default()
        })
        .await
        .ready()
        .unwrap();
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].id, f.course.id);

    let page = catalog
        .set_query(CourseQuery {
            category: Some(String::from("kitchen")),
            ..CourseQuery::default()
        })
        .await
        .ready()
        .unwrap();
    assert_eq!(page.results[0].title, "Cooking basics");

    let state = catalog
        .set_query(CourseQuery {
            search: Some(String::from("underwater basket weaving")),
            ..CourseQuery::default()
        })
        .await;
    assert_eq!(*state, Loadable::Empty);
}

#[tokio::test]
async fn retry_after_failure() {
    let f = Fixture::new();
    f.server
        .fail_next("list_courses", ApiError::Unknown(String::from("boom")));
    let mut catalog = Catalog::new(f.anonymous(), CourseQuery::default());
    assert_eq!(catalog.load().await.error(), Some("Failed to load courses"));
    assert_eq!(catalog.retry().await.ready().unwrap().count, 1);
}

#[tokio::test]
async fn my_courses_with_progress() {
    let f = Fixture::new();
    let student = f.as_student().await;
    let second = f
        .server
        .admin_create_course(f.instructor, new_course("Second course"));
    student.enroll(f.course.id).await.unwrap();
    student.enroll(second.id).await.unwrap();
    progress::mark_completed(&*student, f.lectures[1].id)
        .await
        .unwrap();

    let mut mine = MyCourses::new(student);
    let courses = mine.load().await.ready().unwrap();
    assert_eq!(courses.len(), 2);
    let rust = courses
        .iter()
        .find(|c| c.course.course.id == f.course.id)
        .unwrap();
    assert_eq!(rust.completed_lectures, 1);
    assert_eq!(rust.percentage, 33);
    let empty = courses.iter().find(|c| c.course.course.id == second.id).unwrap();
    assert_eq!(empty.percentage, 0);
}

#[tokio::test]
async fn my_courses_skips_broken_entries() {
    let f = Fixture::new();
    let student = f.as_student().await;
    student.enroll(f.course.id).await.unwrap();

    f.server
        .fail_next("get_course", ApiError::Unknown(String::from("boom")));
    let mut mine = MyCourses::new(student.clone());
    assert_eq!(*mine.load().await, Loadable::Empty);

    let mut mine = MyCourses::new(student);
    assert_eq!(mine.load().await.ready().map(|c| c.len()), Some(1));
}

#[tokio::test]
async fn my_courses_requires_login() {
    let f = Fixture::new();
    let mut mine = MyCourses::new(f.anonymous());
    assert_eq!(mine.load().await.error(), Some("Failed to load your courses"));
}
