use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use dotenvy::dotenv;
use schoolhub::modules::schools::invitations::InvitationService;
use schoolhub_auth::create_access_token;
use schoolhub_cli::preview::{render_plan, split_list};
use schoolhub_cli::seeder;
use schoolhub_config::JwtConfig;
use schoolhub_db::{DatabaseConfig, PgPool, init_db_pool};
use schoolhub_models::curriculum::{ALevelSelection, TvetSelection};
use schoolhub_models::roles::{permissions, system_roles};
use schoolhub_models::{AcademicSelection, plan_academic_structure};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "schoolhub-cli")]
#[command(about = "SchoolHub CLI - Administrative tools for SchoolHub", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the database with fake schools
    SeedSchools {
        /// Number of schools to create
        #[arg(short = 's', long, default_value = "5")]
        schools: usize,
    },
    /// Delete every school (cascades to classes and join requests)
    ClearSchools {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Print the classes and modules a curriculum selection would generate
    PreviewStructure {
        /// School username used as the class username prefix
        #[arg(short = 'u', long, default_value = "school")]
        school_username: String,

        #[arg(long)]
        primary: bool,

        #[arg(long)]
        o_level: bool,

        /// Comma separated A-level combinations, e.g. PCM,MEG
        #[arg(long)]
        a_level: Option<String>,

        /// Comma separated TVET trades, e.g. SOD,NIT
        #[arg(long)]
        tvet: Option<String>,

        /// Comma separated TVET levels (default: all)
        #[arg(long)]
        levels: Option<String>,

        /// Comma separated stream labels, e.g. A,B
        #[arg(long)]
        streams: Option<String>,
    },
    /// Replace a school's four invitation codes and print the new ones
    RotateCodes {
        /// School ID
        #[arg(short = 's', long)]
        school: Uuid,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Mint an access token signed with JWT_SECRET for local testing
    IssueToken {
        /// Subject; a random id when omitted
        #[arg(long)]
        user_id: Option<Uuid>,

        #[arg(short = 'e', long, default_value = "dev@schoolhub.local")]
        email: String,

        #[arg(long)]
        school_id: Option<Uuid>,

        /// Permission name; repeat for several. All permissions when omitted
        #[arg(short = 'p', long = "permission")]
        permissions: Vec<String>,

        /// Include the system admin role
        #[arg(long)]
        system_admin: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::SeedSchools { schools } => handle_seed_schools(schools).await,
        Commands::ClearSchools { yes } => handle_clear_schools(yes).await,
        Commands::PreviewStructure {
            school_username,
            primary,
            o_level,
            a_level,
            tvet,
            levels,
            streams,
        } => {
            let selection = AcademicSelection {
                primary,
                o_level,
                a_level: a_level.as_deref().map(|v| ALevelSelection {
                    combinations: split_list(Some(v)),
                }),
                tvet: tvet.as_deref().map(|v| TvetSelection {
                    trades: split_list(Some(v)),
                    levels: levels.as_deref().map(|l| split_list(Some(l))),
                }),
                streams: split_list(streams.as_deref()),
            };
            handle_preview(&school_username, &selection)
        }
        Commands::RotateCodes { school, yes } => handle_rotate_codes(school, yes).await,
        Commands::IssueToken {
            user_id,
            email,
            school_id,
            permissions,
            system_admin,
        } => handle_issue_token(user_id, &email, school_id, permissions, system_admin),
    };

    if let Err(e) = result {
        eprintln!("\n❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn connect() -> anyhow::Result<PgPool> {
    let config = DatabaseConfig::from_env().context("DATABASE_URL must be set")?;
    let pool = init_db_pool(&config)
        .await
        .context("Failed to connect to database")?;
    Ok(pool)
}

fn confirm(prompt: &str, yes: bool) -> anyhow::Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

async fn handle_seed_schools(count: usize) -> anyhow::Result<()> {
    let pool = connect().await?;
    let ids = seeder::seed_schools(&pool, count).await?;
    println!("✅ Created {} schools", ids.len());
    Ok(())
}

async fn handle_clear_schools(yes: bool) -> anyhow::Result<()> {
    if !confirm("Delete every school, class and join request?", yes)? {
        println!("Aborted");
        return Ok(());
    }
    let pool = connect().await?;
    seeder::clear_schools(&pool).await?;
    println!("✅ Cleared all schools (and associated classes, join requests)");
    Ok(())
}

fn handle_preview(school_username: &str, selection: &AcademicSelection) -> anyhow::Result<()> {
    let plan = plan_academic_structure(school_username, selection)?;
    print!("{}", render_plan(&plan));
    Ok(())
}

async fn handle_rotate_codes(school_id: Uuid, yes: bool) -> anyhow::Result<()> {
    if !confirm("Existing invitation codes will stop working. Continue?", yes)? {
        println!("Aborted");
        return Ok(());
    }

    let pool = connect().await?;
    let codes = InvitationService::regenerate_codes(&pool, None, school_id)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("\n✅ Invitation codes rotated");
    println!("   Student: {}", codes.student_code);
    println!("   Teacher: {}", codes.teacher_code);
    println!("   Staff:   {}", codes.staff_code);
    println!("   Parent:  {}", codes.parent_code);
    Ok(())
}

fn handle_issue_token(
    user_id: Option<Uuid>,
    email: &str,
    school_id: Option<Uuid>,
    requested: Vec<String>,
    system_admin: bool,
) -> anyhow::Result<()> {
    let permissions = if requested.is_empty() {
        permissions::all().into_iter().map(str::to_string).collect()
    } else {
        requested
    };
    let role_ids = if system_admin {
        vec![system_roles::SYSTEM_ADMIN]
    } else {
        vec![]
    };

    let token = create_access_token(
        user_id.unwrap_or_else(Uuid::new_v4),
        email,
        school_id,
        role_ids,
        permissions,
        &JwtConfig::from_env(),
    )
    .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("{}", token);
    Ok(())
}
