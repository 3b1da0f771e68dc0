use crate::cli::commands::TeamCommand;
use crate::config::MeisterConfig;
use crate::errors::MeisterError;

pub async fn handle_team(command: TeamCommand, config: &MeisterConfig) -> Result<(), MeisterError> {
    let db = super::open_database(config)?;
    match command {
        TeamCommand::Add { name, ours } => {
            let team = db.insert_team(&name, ours)?;
            println!("Team {} ({})", team.name, if team.is_self { "ours" } else { "opponent" });
        }
        TeamCommand::List => {
            for team in db.opponents()? {
                println!("{}\t{}", team.id, team.name);
            }
        }
    }
    Ok(())
}
