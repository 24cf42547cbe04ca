use std::path::Path;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use tokio::sync::watch;
use tuition_core::api::{AuthApi, NoteUpload, Query, UploadProgress};
use tuition_core::app_ctx::AppContext;
use tuition_core::blueprint::Blueprint;
use tuition_core::config::reader::ConfigReader;
use tuition_core::filter::{BatchFilter, NoteFilter, StudentFilter, VideoFilter};
use tuition_core::http::ApiError;
use tuition_core::model::{
    AttendanceDraft, AttendanceMark, AttendanceRecord, AttendanceStatus, Batch, BatchDraft,
    EntityId, Note, NoteDraft, Resource, Schedule, Standard, StandardDraft, Student, StudentDraft,
    Subject, SubjectDraft, Video, VideoDraft,
};
use tuition_core::runtime::TargetRuntime;
use tuition_core::store::{Command as StoreCommand, Event, Store, Stored};

use crate::cli::commands::{
    AttendanceAction, BatchAction, Cli, Command, NoteAction, StandardAction, StudentAction,
    SubjectAction, VideoAction,
};
use crate::cli::render::{self, Row};
use crate::cli::{rt, session};

pub async fn fork_run() -> anyhow::Result<()> {
    logger_init();
    let cli = Cli::parse();
    let runtime = rt::init();

    run(cli, runtime).await
}

async fn run(cli: Cli, runtime: TargetRuntime) -> anyhow::Result<()> {
    let config_reader = ConfigReader::init(runtime.clone());
    let config = config_reader.read(&cli.config).await?;

    if let Command::Check = cli.command {
        match Blueprint::try_from(config) {
            Ok(_) => log::info!("Config is valid"),
            Err(e) => log::error!("Invalid config: {}", e),
        }
        return Ok(());
    }

    let blueprint = Blueprint::try_from(config).context("Invalid config")?;
    let session = session::load(&runtime, &blueprint).await;
    let signed_in = session.user().is_some();
    let app_ctx = AppContext { blueprint, runtime };

    let mut store = Store::from_context(&app_ctx, session.clone());
    cancel_on_interrupt(&store);

    let result = execute(cli.command, &mut store, &app_ctx).await;

    if signed_in && session.user().is_none() && session.jar().is_empty() {
        log::warn!("Signed out, run `tuition login` to sign in again");
    }
    session::save(&app_ctx.runtime, &app_ctx.blueprint, &session).await?;
    result
}

async fn execute(command: Command, store: &mut Store, app_ctx: &AppContext) -> anyhow::Result<()> {
    match command {
        Command::Check => {}
        Command::Login { email, password } => {
            let user = AuthApi::new(store.api())
                .login(&email, &password)
                .await
                .map_err(|e| failure(e, "Login failed"))?;
            display(format!("Signed in as {}", render::user(&Some(user))));
        }
        Command::Logout => {
            let result = AuthApi::new(store.api()).logout().await;
            store.reset();
            if let Err(e) = result {
                log::warn!("{}", e.user_message("Logout failed"));
            }
            display("Signed out");
        }
        Command::Whoami => {
            let user = AuthApi::new(store.api())
                .probe()
                .await
                .map_err(|e| failure(e, "Unable to reach the API"))?;
            display(render::user(&user));
        }
        Command::Batches { action } => batches(action, store).await?,
        Command::Students { action } => students(action, store).await?,
        Command::Standards { action } => match action {
            StandardAction::List => {
                list::<Standard>(store, Query::new()).await?;
                display(render::table(
                    &store.state().standards.items().iter().collect::<Vec<_>>(),
                ));
            }
            StandardAction::Create { name, description } => {
                let draft = StandardDraft {
                    name,
                    description,
                    ..Default::default()
                };
                create::<Standard>(store, draft).await?;
            }
            StandardAction::Delete { id } => delete::<Standard>(store, id).await?,
        },
        Command::Subjects { action } => match action {
            SubjectAction::List => {
                list::<Subject>(store, Query::new()).await?;
                display(render::table(
                    &store.state().subjects.items().iter().collect::<Vec<_>>(),
                ));
            }
            SubjectAction::Create {
                name,
                code,
                standard,
                description,
            } => {
                let draft = SubjectDraft {
                    name,
                    code,
                    standard: standard.map(EntityId::from),
                    description,
                };
                create::<Subject>(store, draft).await?;
            }
            SubjectAction::Delete { id } => delete::<Subject>(store, id).await?,
        },
        Command::Notes { action } => notes(action, store, app_ctx).await?,
        Command::Videos { action } => videos(action, store).await?,
        Command::Attendance { action } => attendance(action, store).await?,
    }
    Ok(())
}

async fn batches(action: BatchAction, store: &mut Store) -> anyhow::Result<()> {
    match action {
        BatchAction::List {
            name,
            subject,
            standard,
            teacher,
            status,
            populate,
            refresh,
        } => {
            let mut query = Query::new().force_refresh(refresh);
            if populate {
                query = query.populate("enrolledStudents");
            }
            list::<Batch>(store, query).await?;
            let filter = BatchFilter {
                name,
                standard: standard.map(EntityId::from),
                subject: subject.map(EntityId::from),
                teacher: teacher.map(EntityId::from),
                status,
            };
            display(render::table(&filter.apply(store.state().batches.items())));
        }
        BatchAction::Show { id } => show::<Batch>(store, id).await?,
        BatchAction::Create(args) => {
            let draft = BatchDraft {
                name: args.name,
                standard: args.standard.map(EntityId::from),
                subject: args.subject.map(EntityId::from),
                teacher: args.teacher.map(EntityId::from),
                schedule: Schedule {
                    days: args.days,
                    start_time: args.start,
                    end_time: args.end,
                },
                capacity: args.capacity,
                fees: args.fees,
                status: args.status.unwrap_or_default(),
            };
            create::<Batch>(store, draft).await?;
        }
        BatchAction::Update {
            id,
            name,
            capacity,
            fees,
            status,
        } => {
            let id = EntityId::from(id);
            settled(store.dispatch::<Batch>(StoreCommand::FetchOne(id.clone())).await)?;
            let current = store
                .state()
                .batches
                .get(&id)
                .with_context(|| format!("Batch {} not found", id))?;

            let mut draft = BatchDraft::from(current);
            if let Some(name) = name {
                draft.name = name;
            }
            if capacity.is_some() {
                draft.capacity = capacity;
            }
            if fees.is_some() {
                draft.fees = fees;
            }
            if let Some(status) = status {
                draft.status = status;
            }
            settled(
                store
                    .dispatch::<Batch>(StoreCommand::Update(id.clone(), draft))
                    .await,
            )?;
            display(format!("Updated batch {}", id));
        }
        BatchAction::Delete { id } => delete::<Batch>(store, id).await?,
        BatchAction::Enroll { batch, student } => {
            let (batch, student) = (EntityId::from(batch), EntityId::from(student));
            settled(store.dispatch::<Batch>(StoreCommand::FetchOne(batch.clone())).await)?;
            settled(store.enroll(batch.clone(), student.clone()).await)?;
            display(format!("Enrolled {} in {}", student, batch));
        }
        BatchAction::Unenroll { batch, student } => {
            let (batch, student) = (EntityId::from(batch), EntityId::from(student));
            settled(store.unenroll(batch.clone(), student.clone()).await)?;
            display(format!("Removed {} from {}", student, batch));
        }
        BatchAction::BySubject { subject } => {
            let batches = store
                .batches_by_subject(&EntityId::from(subject))
                .await
                .map_err(|e| failure(e, "Failed to fetch batches"))?;
            display(render::table(&batches.iter().collect::<Vec<_>>()));
        }
    }
    Ok(())
}

async fn students(action: StudentAction, store: &mut Store) -> anyhow::Result<()> {
    match action {
        StudentAction::List {
            search,
            standard,
            subject,
            batch,
        } => {
            list::<Student>(store, Query::new()).await?;
            let filter = StudentFilter {
                search,
                standard: standard.map(EntityId::from),
                subject: subject.map(EntityId::from),
                batch: batch.map(EntityId::from),
            };
            display(render::table(&filter.apply(store.state().students.items())));
        }
        StudentAction::Show { id } => show::<Student>(store, id).await?,
        StudentAction::Create(args) => {
            let draft = StudentDraft {
                name: args.name,
                email: args.email,
                phone: args.phone,
                parent_name: args.parent_name,
                parent_phone: args.parent_phone,
                address: args.address,
                standard: args.standard.map(EntityId::from),
                subjects: args.subjects.into_iter().map(EntityId::from).collect(),
                ..Default::default()
            };
            create::<Student>(store, draft).await?;
        }
        StudentAction::Delete { id } => delete::<Student>(store, id).await?,
    }
    Ok(())
}

async fn notes(action: NoteAction, store: &mut Store, app_ctx: &AppContext) -> anyhow::Result<()> {
    match action {
        NoteAction::List {
            search,
            subject,
            batch,
        } => {
            list::<Note>(store, Query::new()).await?;
            let filter = NoteFilter {
                search,
                subject: subject.map(EntityId::from),
                batch: batch.map(EntityId::from),
                ..Default::default()
            };
            display(render::table(&filter.apply(store.state().notes.items())));
        }
        NoteAction::Upload {
            file,
            title,
            description,
            subject,
            standard,
            batch,
        } => {
            let file_name = Path::new(&file)
                .file_name()
                .and_then(|name| name.to_str())
                .with_context(|| format!("Not a file: {}", file))?
                .to_string();
            let content = app_ctx.runtime.file.read_bytes(&file).await?;
            let draft = NoteDraft {
                title,
                description,
                subject: subject.map(EntityId::from),
                standard: standard.map(EntityId::from),
                batch: batch.map(EntityId::from),
            };

            let (tx, mut rx) = watch::channel(UploadProgress::default());
            let reporter = tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let progress = *rx.borrow_and_update();
                    log::info!(
                        "Uploaded {}% ({}/{} bytes)",
                        progress.percent(),
                        progress.sent,
                        progress.total
                    );
                }
            });
            let event = store
                .upload_note(NoteUpload::new(draft, file_name, content), Some(tx))
                .await;
            reporter.await?;

            if let Event::Uploaded(id) = settled(event)? {
                display(format!("Uploaded note {}", id));
            }
        }
        NoteAction::Delete { id } => delete::<Note>(store, id).await?,
    }
    Ok(())
}

async fn videos(action: VideoAction, store: &mut Store) -> anyhow::Result<()> {
    match action {
        VideoAction::List {
            search,
            subject,
            free,
        } => {
            list::<Video>(store, Query::new()).await?;
            let filter = VideoFilter {
                search,
                subject: subject.map(EntityId::from),
                free,
                ..Default::default()
            };
            display(render::table(&filter.apply(store.state().videos.items())));
        }
        VideoAction::Create {
            title,
            url,
            subject,
            standard,
            description,
            paid,
        } => {
            let draft = VideoDraft {
                title,
                description,
                url,
                subject: subject.map(EntityId::from),
                standard: standard.map(EntityId::from),
                is_free: !paid,
            };
            create::<Video>(store, draft).await?;
        }
        VideoAction::Delete { id } => delete::<Video>(store, id).await?,
    }
    Ok(())
}

async fn attendance(action: AttendanceAction, store: &mut Store) -> anyhow::Result<()> {
    match action {
        AttendanceAction::Show { batch, date } => {
            settled(store.load_attendance(EntityId::from(batch), date).await)?;
            display(render::table(
                &store.state().attendance.items().iter().collect::<Vec<_>>(),
            ));
        }
        AttendanceAction::Mark {
            batch,
            date,
            present,
            absent,
            late,
        } => {
            let marks = |students: Vec<String>, status: AttendanceStatus| {
                students.into_iter().map(move |student| AttendanceMark {
                    student: EntityId::from(student),
                    status,
                })
            };
            let records = marks(present, AttendanceStatus::Present)
                .chain(marks(absent, AttendanceStatus::Absent))
                .chain(marks(late, AttendanceStatus::Late))
                .collect();
            let draft = AttendanceDraft {
                batch: EntityId::from(batch),
                date,
                records,
            };
            create::<AttendanceRecord>(store, draft).await?;
        }
    }
    Ok(())
}

async fn list<R: Stored>(store: &mut Store, query: Query) -> anyhow::Result<()> {
    settled(store.dispatch::<R>(StoreCommand::FetchAll(query)).await)?;
    Ok(())
}

async fn show<R: Stored + Row>(store: &mut Store, id: String) -> anyhow::Result<()> {
    let id = EntityId::from(id);
    settled(store.dispatch::<R>(StoreCommand::FetchOne(id.clone())).await)?;
    let item = R::slice(store.state())
        .get(&id)
        .with_context(|| format!("{} {} not found", R::NOUN, id))?;
    display(render::table(&[item]));
    Ok(())
}

async fn create<R: Stored>(store: &mut Store, draft: R::Draft) -> anyhow::Result<()> {
    if let Event::Created(id) = settled(store.dispatch::<R>(StoreCommand::Create(draft)).await)? {
        display(format!("Created {} {}", R::NOUN, id));
    }
    Ok(())
}

async fn delete<R: Stored>(store: &mut Store, id: String) -> anyhow::Result<()> {
    let id = EntityId::from(id);
    settled(store.dispatch::<R>(StoreCommand::Delete(id.clone())).await)?;
    display(format!("Deleted {} {}", R::NOUN, id));
    Ok(())
}

fn settled(event: Event) -> anyhow::Result<Event> {
    match event {
        Event::Failed(message) => Err(anyhow!(message)),
        Event::Cancelled => bail!("Cancelled"),
        event => Ok(event),
    }
}

fn failure(err: ApiError, fallback: &str) -> anyhow::Error {
    match err {
        ApiError::Validation(errors) => {
            anyhow!("Invalid input:\n{}", render::field_errors(&errors))
        }
        err => anyhow!(err.user_message(fallback)),
    }
}

fn cancel_on_interrupt(store: &Store) {
    let canceller = store.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling the running request");
            canceller.cancel();
        }
    });
}

fn display<T: AsRef<str>>(content: T) {
    println!("{}", content.as_ref());
}

const LOG_LEVEL_VAR: &str = "TUITION_LOG_LEVEL";

/// Log filter comes from `TUITION_LOG_LEVEL`, `info` when it is unset.
fn logger_builder() -> env_logger::Builder {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_LEVEL_VAR, "info"))
}

fn logger_init() {
    logger_builder().init();
}
