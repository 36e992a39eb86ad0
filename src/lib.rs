use std::io::Write;

use anyhow::Context;
use itertools::Itertools;

pub mod api;
pub mod prompt;
pub mod settings;

use api::{BitbucketClient, Repository};
use settings::Settings;

type Result<T> = anyhow::Result<T>;

pub const HELP_FLAGS: [&str; 4] = ["--help", "-h", "/?", "help"];

pub const USAGE: &str = "bb-followers USERNAME -p|PASSWORD [OWNERFILTER]

Example:
\tbb-followers myUser myPassword
";

/// True when any argument, in any position, asks for help.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|arg| HELP_FLAGS.contains(&arg.as_str()))
}

/// Keeps the repositories whose owner is exactly `owner`. A missing or
/// blank owner keeps everything.
pub fn filter_by_owner(repositories: Vec<Repository>, owner: Option<&str>) -> Vec<Repository> {
    match owner.filter(|o| !o.trim().is_empty()) {
        Some(owner) => repositories
            .into_iter()
            .filter(|repo| repo.owner == owner)
            .collect_vec(),
        None => repositories,
    }
}

pub fn report(
    client: &BitbucketClient,
    owner_filter: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "Obtaining a list of repositories from BitBucket...")?;
    let repositories = client
        .list_repositories()
        .context("Cannot list repositories")?;
    let found = repositories.len();
    log::info!("{found} repositories returned");

    let repositories = match owner_filter.filter(|o| !o.trim().is_empty()) {
        Some(owner) => {
            let matched = filter_by_owner(repositories, Some(owner));
            writeln!(
                out,
                "{found} repostories found. {} repostitory matched owner filter '{owner}'",
                matched.len()
            )?;
            matched
        }
        None => {
            writeln!(out, "{found} repostories found.")?;
            repositories
        }
    };

    for repo in &repositories {
        writeln!(out, "{repo}")?;
        let followers = client
            .list_followers(&repo.owner, &repo.slug)
            .with_context(|| format!("Cannot list followers of {}/{}", repo.owner, repo.slug))?;
        for follower in followers {
            writeln!(out, "\t{follower}")?;
        }
    }
    Ok(())
}

pub fn run(settings: Settings, out: &mut impl Write) -> Result<()> {
    let Settings { base_uri, credentials, owner_filter } = settings;
    let username = credentials.username.clone();
    let client = BitbucketClient::with_base_uri(base_uri, credentials)?;
    writeln!(out, "Using URI: {} and user {username}", client.base_uri())?;
    report(&client, owner_filter.as_deref(), out)
}
