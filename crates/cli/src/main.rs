use clap::{Parser, Subcommand};
use postmeta_core::{
    config, CoreConfig, FieldRegistry, MetaFieldAdapter, MetaStore, NewPost, NonEmptyText,
    PostId, PostService, PostStatus, WriteOutcome,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "postmeta")]
#[command(about = "Postmeta post and metadata store CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all posts
    List,
    /// Create a post
    Create {
        /// Post title
        title: String,
        /// Post status: draft (default) or published
        #[arg(long)]
        status: Option<String>,
        /// Explicit slug (derived from the title otherwise)
        #[arg(long)]
        slug: Option<String>,
    },
    /// Show a post record and its metadata
    Show {
        /// Post identifier (32 lowercase hex characters)
        post_id: String,
    },
    /// Write a registered metadata field (the value is sanitised)
    SetMeta {
        /// Post identifier
        post_id: String,
        /// Field name (canonical key or alias)
        field: String,
        /// Raw value; blank values are skipped, never stored
        value: String,
    },
    /// Read a registered metadata field
    GetMeta {
        /// Post identifier
        post_id: String,
        /// Field name (canonical key or alias)
        field: String,
    },
    /// List the registered metadata fields
    Fields,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let post_data_dir = config::post_data_dir_from_env_value(std::env::var("POST_DATA_DIR").ok());
    let cfg = Arc::new(CoreConfig::new(post_data_dir, None)?);
    let registry = Arc::new(FieldRegistry::seo_fields());

    match cli.command {
        Some(Commands::List) => {
            let posts = PostService::new(cfg).list_posts();
            if posts.is_empty() {
                println!("No posts found.");
            } else {
                for post in posts {
                    println!(
                        "ID: {}, Type: {}, Status: {}, Title: {}, Created: {}",
                        post.id,
                        post.post_type.as_str(),
                        post.status.as_str(),
                        post.title,
                        post.created_at
                    );
                }
            }
        }
        Some(Commands::Create {
            title,
            status,
            slug,
        }) => {
            let title = match NonEmptyText::new(&title) {
                Ok(title) => title,
                Err(e) => {
                    eprintln!("Error creating post: {}", e);
                    return Ok(());
                }
            };
            let mut new_post = NewPost::draft(title);
            if let Some(status) = status {
                match PostStatus::parse(&status) {
                    Ok(parsed) => new_post.status = parsed,
                    Err(e) => {
                        eprintln!("Error creating post: {}", e);
                        return Ok(());
                    }
                }
            }
            new_post.slug = slug;
            match PostService::new(cfg).create(new_post) {
                Ok(service) => println!("Created post with ID: {}", service.post_id()),
                Err(e) => eprintln!("Error creating post: {}", e),
            }
        }
        Some(Commands::Show { post_id }) => {
            let service = match PostService::with_id(Arc::clone(&cfg), &post_id) {
                Ok(service) => service,
                Err(e) => {
                    eprintln!("Error showing post: {}", e);
                    return Ok(());
                }
            };
            match service.read() {
                Ok(post) => {
                    println!("ID: {}", post.id);
                    println!("Type: {}", post.post_type.as_str());
                    println!("Status: {}", post.status.as_str());
                    println!("Title: {}", post.title);
                    println!("Slug: {}", post.slug);
                    println!("Created: {}", post.created_at);
                    println!("Updated: {}", post.updated_at);
                    let store = MetaStore::for_post(Arc::clone(&cfg), post.id.clone());
                    match store.all() {
                        Ok(meta) if meta.is_empty() => println!("No metadata."),
                        Ok(meta) => {
                            println!("Metadata:");
                            for (key, value) in meta {
                                println!("  {} = {}", key, value);
                            }
                        }
                        Err(e) => eprintln!("Error reading metadata: {}", e),
                    }
                }
                Err(e) => eprintln!("Error showing post: {}", e),
            }
        }
        Some(Commands::SetMeta {
            post_id,
            field,
            value,
        }) => {
            let post_id = match PostId::parse(&post_id) {
                Ok(post_id) => post_id,
                Err(e) => {
                    eprintln!("Error writing field: {}", e);
                    return Ok(());
                }
            };
            let Some(spec) = registry.resolve(&field) else {
                eprintln!("Unknown field: {}", field);
                return Ok(());
            };
            let adapter = MetaFieldAdapter::new(Arc::clone(&cfg), Arc::clone(&registry));
            match adapter.write(&post_id, spec, &value) {
                Ok(WriteOutcome::Written) => {
                    println!("Stored {} for post {}", spec.key(), post_id);
                }
                Ok(WriteOutcome::SkippedEmpty) => {
                    println!("Value was empty after sanitising; nothing stored");
                }
                Err(e) => eprintln!("Error writing field: {}", e),
            }
        }
        Some(Commands::GetMeta { post_id, field }) => match PostId::parse(&post_id) {
            Ok(post_id) => {
                let adapter = MetaFieldAdapter::new(Arc::clone(&cfg), Arc::clone(&registry));
                println!("{}", adapter.read(&post_id, &field));
            }
            Err(e) => eprintln!("Error reading field: {}", e),
        },
        Some(Commands::Fields) => {
            for field in registry.fields() {
                println!(
                    "{} ({}) aliases: {} - {}",
                    field.key(),
                    field.kind().as_str(),
                    field.aliases().join(", "),
                    field.description()
                );
            }
        }
        None => {
            println!("Use 'postmeta --help' for commands");
        }
    }

    Ok(())
}
