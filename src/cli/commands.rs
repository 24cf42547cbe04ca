use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tuition_core::model::BatchStatus;

const VERSION: &str = match option_env!("APP_VERSION") {
    Some(version) => version,
    _ => "0.1.0-dev",
};

#[derive(Parser)]
#[command(name = "tuition", version = VERSION)]
pub struct Cli {
    /// Path for the configuration file or http(s) link to config file.
    #[arg(short, long, global = true, default_value = "tuition.json")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Checks the configuration file for errors
    Check,
    /// Signs in, the session is kept for the following commands
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Signs out and forgets the session
    Logout,
    /// Shows who the API thinks is signed in
    Whoami,
    /// Batches (class sections) and their enrollment
    Batches {
        #[command(subcommand)]
        action: BatchAction,
    },
    Students {
        #[command(subcommand)]
        action: StudentAction,
    },
    Standards {
        #[command(subcommand)]
        action: StandardAction,
    },
    Subjects {
        #[command(subcommand)]
        action: SubjectAction,
    },
    /// Study notes (PDF)
    Notes {
        #[command(subcommand)]
        action: NoteAction,
    },
    Videos {
        #[command(subcommand)]
        action: VideoAction,
    },
    Attendance {
        #[command(subcommand)]
        action: AttendanceAction,
    },
}

#[derive(Subcommand)]
pub enum BatchAction {
    List {
        /// Part of the batch name
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        standard: Option<String>,
        #[arg(long)]
        teacher: Option<String>,
        #[arg(long)]
        status: Option<BatchStatus>,
        /// Ask the API to embed the enrolled students
        #[arg(long)]
        populate: bool,
        /// Take the listing as it comes, without restoring known enrollments.
        /// Enrollments are only remembered within one run, every invocation
        /// starts from an empty store.
        #[arg(long)]
        refresh: bool,
    },
    Show {
        id: String,
    },
    Create(BatchArgs),
    /// Changes a batch, refused if someone else changed it in the meantime
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        capacity: Option<u32>,
        #[arg(long)]
        fees: Option<f64>,
        #[arg(long)]
        status: Option<BatchStatus>,
    },
    Delete {
        id: String,
    },
    /// Adds a student to a batch
    Enroll {
        batch: String,
        student: String,
    },
    /// Removes a student from a batch
    Unenroll {
        batch: String,
        student: String,
    },
    /// Batches teaching a subject
    BySubject {
        subject: String,
    },
}

#[derive(Args)]
pub struct BatchArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub subject: Option<String>,
    #[arg(long)]
    pub standard: Option<String>,
    #[arg(long)]
    pub teacher: Option<String>,
    /// e.g. Mon,Wed,Fri
    #[arg(long, value_delimiter = ',')]
    pub days: Vec<String>,
    /// HH:MM
    #[arg(long)]
    pub start: Option<String>,
    /// HH:MM
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub capacity: Option<u32>,
    #[arg(long)]
    pub fees: Option<f64>,
    #[arg(long)]
    pub status: Option<BatchStatus>,
}

#[derive(Subcommand)]
pub enum StudentAction {
    List {
        /// Part of the name, email or phone
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        standard: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        batch: Option<String>,
    },
    Show {
        id: String,
    },
    Create(StudentArgs),
    Delete {
        id: String,
    },
}

#[derive(Args)]
pub struct StudentArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub parent_name: Option<String>,
    #[arg(long)]
    pub parent_phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub standard: Option<String>,
    #[arg(long, value_delimiter = ',')]
    pub subjects: Vec<String>,
}

#[derive(Subcommand)]
pub enum StandardAction {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum SubjectAction {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        standard: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum NoteAction {
    List {
        /// Part of the title or description
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        batch: Option<String>,
    },
    /// Uploads a PDF
    Upload {
        file: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        standard: Option<String>,
        #[arg(long)]
        batch: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum VideoAction {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        free: Option<bool>,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        standard: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        paid: bool,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum AttendanceAction {
    Show {
        batch: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Records one day of a batch, students not listed are left out
    Mark {
        batch: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, value_delimiter = ',')]
        present: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        absent: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        late: Vec<String>,
    },
}
