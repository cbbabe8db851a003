use clap::{ArgGroup, Parser, ValueEnum};

use crate::{language::Language, session::Provider};

#[derive(Parser, Debug, Clone)]
#[command(name = "codepad", about = "Terminal code editor backed by a remote execution service", version)]
#[command(group(ArgGroup::new("mode").args(["run", "list_languages", "login", "logout", "whoami"]).multiple(false)))]
pub struct Cli {
    /// Language to start with (javascript, python, java, typescript, cpp, kotlin).
    #[arg(short = 'l', long, value_parser = parse_language)]
    pub language: Option<Language>,

    /// Run a source file once and print its output instead of opening the editor.
    #[arg(short = 'r', long, value_name = "FILE")]
    pub run: Option<String>,

    /// List available languages and their versions.
    #[arg(long = "list-languages", visible_alias = "ll")]
    pub list_languages: bool,

    /// Sign in with the given provider.
    #[arg(long, value_enum, value_name = "PROVIDER")]
    pub login: Option<LoginProvider>,

    /// Identity token for `--login google`; read from stdin when omitted.
    #[arg(long, requires = "login")]
    pub credential: Option<String>,

    /// Callback URL for `--login github`, when pasting it instead of listening for it.
    #[arg(long = "callback-url", requires = "login")]
    pub callback_url: Option<String>,

    /// Sign out and clear the stored identity.
    #[arg(long)]
    pub logout: bool,

    /// Show the signed-in identity.
    #[arg(long)]
    pub whoami: bool,

    /// Log at debug level.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoginProvider {
    Github,
    Google,
}

impl From<LoginProvider> for Provider {
    fn from(p: LoginProvider) -> Self {
        match p {
            LoginProvider::Github => Provider::GitHub,
            LoginProvider::Google => Provider::Google,
        }
    }
}

fn parse_language(s: &str) -> Result<Language, String> {
    s.parse::<Language>().map_err(|e| e.to_string())
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_language() {
        let cli = Cli::try_parse_from(["codepad", "--run", "main.py", "-l", "py"]).unwrap();
        assert_eq!(cli.run.as_deref(), Some("main.py"));
        assert_eq!(cli.language, Some(Language::Python));
    }

    #[test]
    fn test_modes_are_exclusive() {
        assert!(Cli::try_parse_from(["codepad", "--logout", "--whoami"]).is_err());
    }

    #[test]
    fn test_credential_requires_login() {
        assert!(Cli::try_parse_from(["codepad", "--credential", "a.b.c"]).is_err());
        let cli = Cli::try_parse_from(["codepad", "--login", "google", "--credential", "a.b.c"]).unwrap();
        assert_eq!(cli.login, Some(LoginProvider::Google));
    }

    #[test]
    fn test_unknown_language_rejected() {
        assert!(Cli::try_parse_from(["codepad", "-l", "cobol"]).is_err());
    }
}
