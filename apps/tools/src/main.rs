use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shared::{domain::HeatingProgramDefinition, protocol::NewProgram};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/microwave.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    ListPrograms,
    ShowProgram {
        name: String,
    },
    AddProgram {
        #[arg(long)]
        name: String,
        #[arg(long)]
        food: String,
        /// Seconds.
        #[arg(long)]
        time: i64,
        #[arg(long)]
        power: i64,
        #[arg(long)]
        marker: char,
        #[arg(long)]
        instructions: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::ListPrograms => {
            for program in storage.list_programs().await? {
                println!("{}", summary_line(&program));
            }
        }
        Command::ShowProgram { name } => {
            let Some(program) = storage.find_program_by_name(&name).await? else {
                bail!("no program named '{name}'");
            };
            println!("{}", summary_line(&program));
            println!("food: {}", program.food);
            if let Some(instructions) = &program.instructions {
                println!("instructions: {instructions}");
            }
        }
        Command::AddProgram {
            name,
            food,
            time,
            power,
            marker,
            instructions,
        } => {
            let program = heating::register_program(
                &storage,
                NewProgram {
                    name,
                    food,
                    time_in_seconds: time,
                    power,
                    heating_char: marker,
                    instructions,
                },
            )
            .await?;
            println!("created {}", summary_line(&program));
        }
    }

    Ok(())
}

fn summary_line(program: &HeatingProgramDefinition) -> String {
    format!(
        "{} [{}] {} at power {}{}",
        program.name,
        program.heating_char,
        heating::format_display_time(program.time_in_seconds),
        program.power,
        if program.is_predefined { " (predefined)" } else { "" },
    )
}
