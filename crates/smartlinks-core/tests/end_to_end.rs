use smartlinks_core::*;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug)]
struct Movie {
    id: ObjectId,
    title: String,
    year: i64,
}

impl Movie {
    fn new(id: ObjectId, title: &str, year: i64) -> Arc<Self> {
        Arc::new(Self {
            id,
            title: title.to_string(),
            year,
        })
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.year)
    }
}

impl Content for Movie {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "title" => Some(self.title.as_str().into()),
            "year" => Some(self.year.into()),
            "url" => Some(format!("/movies/{}/", self.id).into()),
            _ => None,
        }
    }

    fn embed(&self, attribute: &str, options: &EmbedOptions) -> Result<String> {
        match attribute {
            "poster" => Ok(format!(
                "<img src=\"/posters/{}.jpg\" width=\"{}\">",
                self.id,
                options.named.get("size").map_or("300", String::as_str)
            )),
            _ => unreachable!("only allow-listed attributes are embedded"),
        }
    }
}

fn movie_schema() -> ContentSchema {
    ContentSchema::new("movie")
        .with_fields(["title", "year", "url"])
        .with_method("poster", 0)
        .with_method("unapproved_method", 0)
        .with_method("similar_to", 1)
}

struct World {
    smartlinks: Smartlinks,
    movies: Arc<MemorySource>,
    _temp: TempDir,
}

fn world(movies: &[Arc<Movie>]) -> World {
    init_logging();
    let temp_dir = TempDir::new().unwrap();

    let source = Arc::new(MemorySource::new(movie_schema()));
    for movie in movies {
        source.insert(movie.clone()).unwrap();
    }

    let configuration = LinkConfiguration::new(source.clone())
        .with_searched_fields([FieldSet::from("title"), FieldSet::from(["title", "year"])])
        .with_embeddable_attributes(["poster"]);

    let mut registry = Registry::new();
    registry
        .register(["m", "movie"], Arc::new(configuration))
        .unwrap();

    let smartlinks = Smartlinks::open(temp_dir.path().join("index.redb"), registry).unwrap();
    smartlinks.rebuild_index().unwrap();

    World {
        smartlinks,
        movies: source,
        _temp: temp_dir,
    }
}

fn keys_of(smartlinks: &Smartlinks, content_type: &str, object_id: ObjectId) -> BTreeSet<String> {
    smartlinks
        .index()
        .entries_for_object(content_type, object_id)
        .unwrap()
        .into_iter()
        .map(|entry| entry.value)
        .collect()
}

fn resolved_id(smartlinks: &Smartlinks, raw: &str) -> Option<ObjectId> {
    smartlinks
        .object_for(raw)
        .unwrap()
        .map(|(_, object)| object.id())
}

#[test]
fn test_field_sets_are_order_sensitive() {
    let world = world(&[Movie::new(1, "Mad Max", 1984)]);
    let smartlinks = &world.smartlinks;

    assert_eq!(
        keys_of(smartlinks, "movie", 1),
        ["madmax", "madmax1984"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()
    );

    assert_eq!(resolved_id(smartlinks, "[[ Mad Max ]]"), Some(1));
    assert_eq!(resolved_id(smartlinks, "[[ Mad Max 1984 ]]"), Some(1));
    assert_eq!(resolved_id(smartlinks, "[[ mad max - 1984 ]]"), Some(1));
    assert_eq!(resolved_id(smartlinks, "[[ 1984 Mad Max ]]"), None);
}

#[test]
fn test_shared_titles_are_ambiguous() {
    let world = world(&[
        Movie::new(1, "Dirty Harry", 1971),
        Movie::new(2, "Dirty Harry", 1976),
    ]);
    let smartlinks = &world.smartlinks;

    assert!(matches!(
        smartlinks.resolve(None, "Dirty Harry").unwrap(),
        Resolution::Ambiguous { .. }
    ));
    assert!(matches!(
        smartlinks.resolve(Some("movie"), "dirty harry").unwrap(),
        Resolution::Ambiguous { .. }
    ));
    assert_eq!(resolved_id(smartlinks, "[[ Dirty Harry: 1976 ]]"), Some(2));

    assert_eq!(
        smartlinks.render("[[ Dirty Harry ]]").unwrap(),
        "<span class=\"smartlinks-ambiguous\">Dirty Harry</span>"
    );
}

#[test]
fn test_unapproved_embed_renders_disallowed_template() {
    let world = world(&[Movie::new(1, "Mad Max", 1984)]);

    // Movie::embed panics for anything but "poster"
    assert_eq!(
        world.smartlinks.render("{{ Mad Max | unapproved_method }}").unwrap(),
        "<span class=\"smartlinks-unallowed\">{{ Mad Max | unapproved_method }}</span>"
    );
    assert_eq!(
        world.smartlinks.render("{{ Mad Max | poster | size=120 }}").unwrap(),
        "<img src=\"/posters/1.jpg\" width=\"120\">"
    );
}

#[test]
fn test_escaped_links_pass_through_unchanged() {
    let world = world(&[Movie::new(1, "Mad Max", 1984)]);

    let text = r"Write \[[ Mad Max ]] to link to [[ Mad Max ]].";
    assert_eq!(
        world.smartlinks.render(text).unwrap(),
        r#"Write \[[ Mad Max ]] to link to <a href="/movies/1/" title="Mad Max (1984)">Mad Max</a>."#
    );
}

#[test]
fn test_prefix_fallback() {
    let world = world(&[
        Movie::new(1, "One Hundred Years of Solitude", 1967),
        Movie::new(2, "Mad Max", 1979),
        Movie::new(3, "Mad Max 2", 1981),
    ]);
    let smartlinks = &world.smartlinks;

    assert_eq!(resolved_id(smartlinks, "[[ One Hundred Years ]]"), Some(1));
    // Exact match wins over the longer keys sharing the prefix
    assert_eq!(resolved_id(smartlinks, "[[ Mad Max ]]"), Some(2));
    // Prefix shared by two objects
    assert!(matches!(
        smartlinks.resolve(None, "Mad").unwrap(),
        Resolution::Ambiguous { .. }
    ));
}

#[test]
fn test_lifecycle_events_keep_index_in_step() {
    let world = world(&[]);
    let smartlinks = &world.smartlinks;

    let movie = Movie::new(5, "Scarface", 1932);
    world.movies.insert(movie.clone()).unwrap();
    smartlinks
        .notify("movie", movie.as_ref(), ObjectEvent::Created)
        .unwrap();
    assert_eq!(resolved_id(smartlinks, "[[ Scarface ]]"), Some(5));

    let remake = Movie::new(5, "Scarface", 1983);
    world.movies.insert(remake.clone()).unwrap();
    smartlinks
        .notify("movie", remake.as_ref(), ObjectEvent::Updated)
        .unwrap();
    assert_eq!(
        keys_of(smartlinks, "movie", 5),
        ["scarface", "scarface1983"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()
    );
    assert_eq!(resolved_id(smartlinks, "[[ Scarface 1932 ]]"), None);

    world.movies.remove(5).unwrap();
    smartlinks
        .notify("movie", remake.as_ref(), ObjectEvent::Deleted)
        .unwrap();
    assert!(keys_of(smartlinks, "movie", 5).is_empty());
    assert_eq!(resolved_id(smartlinks, "[[ Scarface ]]"), None);

    // Unknown content types are ignored
    assert_eq!(
        smartlinks
            .notify("book", remake.as_ref(), ObjectEvent::Created)
            .unwrap(),
        0
    );
}

#[test]
fn test_registration_validation() {
    let source: Arc<dyn ObjectSource> = Arc::new(MemorySource::new(movie_schema()));
    let mut registry = Registry::new();

    let missing = LinkConfiguration::new(source.clone()).with_searched_fields(["director"]);
    assert!(matches!(
        registry.register(["m"], Arc::new(missing)),
        Err(SmartlinkError::IncorrectlyConfigured(_))
    ));

    let with_args = LinkConfiguration::new(source.clone()).with_searched_fields(["similar_to"]);
    assert!(matches!(
        registry.register(["m"], Arc::new(with_args)),
        Err(SmartlinkError::IncorrectlyConfigured(_))
    ));

    let valid = Arc::new(LinkConfiguration::new(source).with_searched_fields(["title", "pk", "to_string"]));
    registry.register(["m"], valid.clone()).unwrap();
    assert!(matches!(
        registry.register(["m"], valid),
        Err(SmartlinkError::AlreadyRegistered { .. })
    ));
}

#[test]
fn test_labels_are_html_escaped() {
    let world = world(&[Movie::new(1, "Mad Max", 1984)]);

    assert_eq!(
        world.smartlinks.render("[[ Casablanca | <b>Play it</b> ]]").unwrap(),
        "<span class=\"smartlinks-unresolved\">&lt;b&gt;Play it&lt;/b&gt;</span>"
    );
}

#[test]
fn test_smartlink_field() {
    let world = world(&[Movie::new(1, "Mad Max", 1984)]);
    let engine = world.smartlinks.engine();

    let link = SmartLink::from_input("Mad Max");
    assert_eq!(link.raw(), "[[ Mad Max ]]");
    assert_eq!(link.label().as_deref(), Some("Mad Max"));
    assert_eq!(link.object(&engine).unwrap().map(|o| o.id()), Some(1));
    assert_eq!(link.url(&engine).unwrap(), "/movies/1/");
    assert_eq!(
        link.rendered(&engine).unwrap(),
        "<a href=\"/movies/1/\" title=\"Mad Max (1984)\">Mad Max</a>"
    );

    let missing = SmartLink::new("[[ Casablanca ]]");
    assert!(missing.object(&engine).unwrap().is_none());
    assert_eq!(missing.url(&engine).unwrap(), "");
}

#[test]
fn test_smartlink_validator() {
    let world = world(&[Movie::new(1, "Mad Max", 1984)]);
    let engine = world.smartlinks.engine();

    let lenient = SmartLinkValidator::new(false);
    let strict = SmartLinkValidator::new(true);

    lenient.validate("", &engine).unwrap();
    lenient.validate("[[ Casablanca ]]", &engine).unwrap();
    lenient.validate("{{ Mad Max | poster }}", &engine).unwrap();
    strict.validate("[[ m->Mad Max | the film ]]", &engine).unwrap();

    match lenient.validate("Mad Max", &engine) {
        Err(SmartlinkError::Validation(message)) => assert_eq!(message, SmartLinkValidator::MESSAGE),
        other => panic!("expected validation error, got {:?}", other),
    }
    match strict.validate("[[ Casablanca ]]", &engine) {
        Err(SmartlinkError::Validation(message)) => {
            assert_eq!(message, SmartLinkValidator::UNRESOLVED_MESSAGE)
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_custom_links() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();

    let links = Arc::new(MemorySource::new(CustomLink::schema()));
    links
        .insert(Arc::new(
            CustomLink::new(1, "rust book\nthe book", "https://doc.rust-lang.org/book/")
                .with_description("The Rust Programming Language"),
        ))
        .unwrap();

    let mut registry = Registry::new();
    registry
        .register(["link"], Arc::new(CustomLink::configuration(links)))
        .unwrap();

    let smartlinks = Smartlinks::open(temp_dir.path().join("custom.redb"), registry).unwrap();
    let report = smartlinks.rebuild_index().unwrap();
    assert_eq!(report.entries, 2);

    assert_eq!(
        smartlinks.url_for("[[ The Book ]]").unwrap().as_deref(),
        Some("https://doc.rust-lang.org/book/")
    );
    assert_eq!(
        smartlinks.render("[[ link->rust book | TRPL ]]").unwrap(),
        "<a href=\"https://doc.rust-lang.org/book/\" \
         title=\"[[ rust book ]], [[ the book ]] → https://doc.rust-lang.org/book/\">TRPL</a>"
    );
}

/// Links every query to a page of an external wiki, without touching the index.
struct WikiFinder;

#[derive(Debug)]
struct WikiPage {
    title: String,
}

impl fmt::Display for WikiPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

impl Content for WikiPage {
    fn id(&self) -> ObjectId {
        0
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "url" => Some(format!("https://en.wikipedia.org/wiki/{}", self.title.replace(' ', "_")).into()),
            _ => None,
        }
    }
}

impl ObjectFinder for WikiFinder {
    fn find_object(
        &self,
        _configuration: &LinkConfiguration,
        _index: &dyn SearchIndex,
        query: &str,
    ) -> Result<Lookup<Arc<dyn Content>>> {
        let title = query.trim();
        if title.is_empty() {
            return Ok(Lookup::NotFound);
        }
        Ok(Lookup::Found(Arc::new(WikiPage {
            title: title.to_string(),
        })))
    }
}

#[test]
fn test_custom_finder() {
    let world = world(&[Movie::new(1, "Mad Max", 1984)]);
    let temp_dir = TempDir::new().unwrap();

    let movies: Arc<dyn ObjectSource> = world.movies.clone();
    let wiki_pages: Arc<dyn ObjectSource> = Arc::new(MemorySource::new(ContentSchema::new("wiki_page")));

    let mut registry = Registry::new();
    registry
        .register(
            ["m"],
            Arc::new(LinkConfiguration::new(movies).with_searched_fields(["title"])),
        )
        .unwrap();
    registry
        .register(
            ["w", "wiki"],
            Arc::new(
                LinkConfiguration::new(wiki_pages)
                    .with_searched_fields(Vec::<FieldSet>::new())
                    .with_finder(Arc::new(WikiFinder)),
            ),
        )
        .unwrap();

    let smartlinks = Smartlinks::open(temp_dir.path().join("wiki.redb"), registry).unwrap();
    smartlinks.rebuild_index().unwrap();

    assert_eq!(
        smartlinks.url_for("[[ wiki->Road Warrior ]]").unwrap().as_deref(),
        Some("https://en.wikipedia.org/wiki/Road_Warrior")
    );
    // Untyped: movies first, the wiki catches everything else
    assert_eq!(resolved_id(&smartlinks, "[[ Mad Max ]]"), Some(1));
    assert_eq!(
        smartlinks.url_for("[[ Casablanca ]]").unwrap().as_deref(),
        Some("https://en.wikipedia.org/wiki/Casablanca")
    );
}
