use clap::Parser;
use tagflow::application::{
    CheckTemplatesService, ListTagsService, RenderOptions, RenderTemplateService,
};
use tagflow::cli::{format_check_reports, format_tag_list, Cli, Commands};
use tagflow::domain::tags::TagRegistry;
use tagflow::error::TagflowError;
use tagflow::infrastructure::{Config, FileSystemRepository};

fn main() {
    let cli = Cli::parse();

    // A registry that fails to build is fatal before any command runs
    let registry = match TagRegistry::standard() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    match run(cli, &registry) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e.display_with_suggestions());
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: Cli, registry: &TagRegistry) -> Result<i32, TagflowError> {
    match cli.command {
        Commands::Render {
            template,
            vars,
            strict,
        } => {
            let config =
                Config::load_from_dir(&std::env::current_dir()?)?.with_env_overrides()?;
            let service = RenderTemplateService::new(FileSystemRepository::new(), registry);
            let options = RenderOptions {
                template,
                variables: vars,
                // The flag only turns strictness on; config decides otherwise
                strict: strict.then_some(true),
            };
            let output = service.execute(&options, &config)?;
            print!("{}", output);
            Ok(0)
        }
        Commands::Check { path } => {
            let service = CheckTemplatesService::new(FileSystemRepository::new(), registry);
            let reports = service.execute(&path)?;
            print!("{}", format_check_reports(&reports));
            if reports.iter().all(|r| r.is_ok()) {
                Ok(0)
            } else {
                Ok(2)
            }
        }
        Commands::Tags => {
            let tags = ListTagsService::new(registry).execute();
            print!("{}", format_tag_list(&tags));
            Ok(0)
        }
    }
}
