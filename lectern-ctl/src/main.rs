use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use lectern_client::{
    api::{CommentId, CommentOrdering, CourseId, CourseQuery, LectureId, Registration},
    pages::{Catalog, CommentThread, CoursePage, LecturePlayer},
    progress, Backend, ClientConfig, CommentNode, FileStore, HttpBackend, Loadable, Session,
};

#[derive(structopt::StructOpt)]
struct Opt {
    /// Base URL of the server
    #[structopt(short, long, env = "LECTERN_HOST", default_value = "http://localhost:8000")]
    host: String,

    /// Where the login session is kept between runs
    #[structopt(
        short,
        long,
        env = "LECTERN_SESSION",
        default_value = ".lectern-session.json",
        parse(from_os_str)
    )]
    session_file: PathBuf,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Log in and remember the session
    Login {
        username: String,

        #[structopt(long, env = "LECTERN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account, then log into it
    Register {
        username: String,
        email: String,

        #[structopt(long, env = "LECTERN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    Logout,

    /// Show the logged-in user
    Whoami,

    /// List published courses
    Courses {
        #[structopt(long)]
        search: Option<String>,

        #[structopt(long)]
        category: Option<String>,

        /// eg. `-created_at`, `lectures_count`
        #[structopt(long)]
        ordering: Option<String>,

        #[structopt(long)]
        page: Option<u32>,
    },

    /// Show a course with its lectures
    Course { id: i64 },

    Enroll { course: i64 },

    Unenroll { course: i64 },

    /// Show a lecture
    Lecture { id: i64 },

    /// Show progress over a course
    Progress { course: i64 },

    /// Mark a lecture as completed
    Complete { lecture: i64 },

    /// Record how far a video lecture was watched, in seconds
    Watch {
        lecture: i64,
        current: f64,
        duration: f64,
    },

    /// Show the discussion of a lecture
    Comments {
        lecture: i64,

        #[structopt(long)]
        oldest_first: bool,
    },

    /// Post a comment, or a reply with `--parent`
    Comment {
        lecture: i64,
        text: String,

        #[structopt(long)]
        parent: Option<i64>,
    },
}

fn print_tree(node: &CommentNode) {
    for (depth, n) in node.walk() {
        println!(
            "{:indent$}#{} {} ({}): {}",
            "",
            n.id(),
            n.comment.author.username,
            n.comment.created_at.format("%Y-%m-%d %H:%M"),
            n.comment.content,
            indent = 4 * depth,
        );
    }
}

fn require<T>(state: &Loadable<T>, what: &str) -> anyhow::Result<()> {
    match state {
        Loadable::Failed(msg) => anyhow::bail!("{msg}"),
        Loadable::NotFound => anyhow::bail!("{what} not found"),
        _ => Ok(()),
    }
}

async fn run(
    session: &mut Session<HttpBackend, FileStore>,
    config: &ClientConfig,
    cmd: Command,
) -> anyhow::Result<()> {
    let backend = session.backend().clone();
    match cmd {
        Command::Login { username, password } => {
            let user = session.login(&username, &password).await?;
            println!("Logged in as {}", user.username);
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let user = session
                .register(&Registration {
                    username,
                    email,
                    password2: password.clone(),
                    password,
                })
                .await?;
            println!("Registered and logged in as {}", user.username);
        }
        Command::Logout => {
            session.logout();
            println!("Logged out");
        }
        Command::Whoami => match session.user() {
            Some(u) => println!("{} <{}>", u.username, u.email),
            None => println!("Not logged in"),
        },
        Command::Courses {
            search,
            category,
            ordering,
            page,
        } => {
            let query = CourseQuery {
                search,
                category,
                instructor: None,
                ordering,
                page,
            };
            let mut catalog = Catalog::new(backend, query);
            let state = catalog.load().await;
            require(state, "page")?;
            match state.ready() {
                None => println!("No courses found"),
                Some(page) => {
                    for c in &page.results {
                        println!(
                            "#{} {} by {} ({} lectures)",
                            c.id, c.title, c.instructor.username, c.lectures_count
                        );
                    }
                    println!("{} courses in total", page.count);
                }
            }
        }
        Command::Course { id } => {
            let mut page = CoursePage::new(backend, CourseId(id));
            let state = page.load().await;
            require(state, "course")?;
            if let Some(v) = state.ready() {
                let c = &v.detail.course;
                println!("#{} {}", c.id, c.title);
                println!("by {}", c.instructor.username);
                println!("{}", c.description);
                if v.is_enrolled() {
                    println!("Enrolled, {}% completed", v.percentage);
                }
                let mut lectures = v.detail.lectures.iter().collect::<Vec<_>>();
                lectures.sort_by_key(|l| l.order);
                for l in lectures {
                    let done = v.progress.get(&l.id).copied().unwrap_or(false);
                    println!(
                        "  [{}] #{} {} ({})",
                        if done { "x" } else { " " },
                        l.id,
                        l.title,
                        l.content_type.as_str()
                    );
                }
            }
        }
        Command::Enroll { course } => {
            let e = backend.enroll(CourseId(course)).await?;
            println!("Enrolled in course #{} (enrollment #{})", e.course, e.id);
        }
        Command::Unenroll { course } => {
            let mut page = CoursePage::new(backend, CourseId(course));
            require(page.load().await, "course")?;
            let enrolled = page
                .state()
                .ready()
                .map(|v| v.is_enrolled())
                .unwrap_or(false);
            anyhow::ensure!(enrolled, "not enrolled in course #{course}");
            page.unenroll().await?;
            println!("Unenrolled from course #{course}");
        }
        Command::Lecture { id } => {
            let l = backend.get_lecture(LectureId(id)).await?;
            println!("#{} {} ({})", l.id, l.title, l.content_type.as_str());
            if !l.video_url.is_empty() {
                println!("{}", l.video_url);
            }
            if let Some(url) = &l.file_url {
                println!("{url}");
            }
            if !l.content_text.is_empty() {
                println!("\n{}", l.content_text);
            }
        }
        Command::Progress { course } => {
            let course = CourseId(course);
            let detail = backend.get_course(course).await?;
            let records = progress::course_progress(&*backend, course).await?;
            let done = progress::build_progress_map(&records);
            println!(
                "{}: {}% completed",
                detail.course.title,
                progress::calculate_course_progress(&records, detail.lectures.len() as i64)
            );
            for r in &records {
                println!(
                    "  lecture #{}: {}%{}",
                    r.lecture,
                    r.progress_percentage,
                    if done.get(&r.lecture).copied().unwrap_or(false) {
                        ", completed"
                    } else {
                        ""
                    }
                );
            }
        }
        Command::Complete { lecture } => {
            progress::mark_completed(&*backend, LectureId(lecture)).await?;
            println!("Lecture #{lecture} completed");
        }
        Command::Watch {
            lecture,
            current,
            duration,
        } => {
            let l = backend.get_lecture(LectureId(lecture)).await?;
            let mut player = LecturePlayer::from_config(backend, config, l.course, l.id);
            let r = player
                .save_position(current, duration)
                .await?
                .context("duration must be a positive number of seconds")?;
            println!(
                "Lecture #{}: {}% watched{}",
                r.lecture,
                r.progress_percentage,
                if r.completed { ", completed" } else { "" }
            );
        }
        Command::Comments {
            lecture,
            oldest_first,
        } => {
            let mut thread = CommentThread::new(backend, LectureId(lecture));
            let ordering = match oldest_first {
                true => CommentOrdering::OldestFirst,
                false => CommentOrdering::NewestFirst,
            };
            let state = thread.set_ordering(ordering).await;
            require(state, "lecture")?;
            match state.ready() {
                None => println!("No comments yet"),
                Some(roots) => roots.iter().for_each(print_tree),
            }
        }
        Command::Comment {
            lecture,
            text,
            parent,
        } => {
            let mut thread = CommentThread::new(backend, LectureId(lecture));
            require(thread.load().await, "lecture")?;
            let c = match parent {
                None => thread.post(&text).await?,
                Some(parent) => thread.reply(CommentId(parent), &text).await?,
            };
            println!("Posted comment #{}", c.id);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opt = <Opt as structopt::StructOpt>::from_args();

    let config = ClientConfig::new(opt.host);
    tracing::debug!(host = %config.host, session = ?opt.session_file, "starting");
    let backend = Arc::new(HttpBackend::from_config(&config));
    let mut session = Session::new(backend, FileStore::new(opt.session_file));
    session.hydrate().await;

    run(&mut session, &config, opt.cmd).await?;

    session
        .persist()
        .context("saving session for the next run")?;
    Ok(())
}
