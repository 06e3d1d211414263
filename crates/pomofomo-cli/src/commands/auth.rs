use clap::Subcommand;

use super::open_store;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in; recorded sessions are stored under this user
    Login {
        /// User id
        user: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let (_db, identity) = open_store()?;

    match action {
        AuthAction::Login { user } => {
            let user = identity.sign_in(&user)?;
            println!("signed in as {user}");
        }
        AuthAction::Logout => {
            if identity.sign_out()? {
                println!("signed out");
            } else {
                println!("not signed in");
            }
        }
        AuthAction::Whoami => match identity.user()? {
            Some(user) => println!("{user}"),
            None => println!("not signed in"),
        },
    }
    Ok(())
}
