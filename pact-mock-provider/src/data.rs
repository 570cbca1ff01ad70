use std::{
    collections::{btree_map::Entry, BTreeMap},
    fmt,
};

/// The body of a request or response.
///
/// `Empty` and `Missing` are different things: a request sent with `Content-Length: 0` has an
/// empty body, a request sent without any body framing has none at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum OptionalBody {
    #[default]
    Missing,
    Empty,
    Present(Vec<u8>),
}

impl OptionalBody {
    pub fn is_present(&self) -> bool {
        matches!(self, OptionalBody::Present(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, OptionalBody::Missing)
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            OptionalBody::Present(bytes) => bytes,
            OptionalBody::Missing | OptionalBody::Empty => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into()
    }
}

impl From<&str> for OptionalBody {
    fn from(text: &str) -> Self {
        text.as_bytes().to_vec().into()
    }
}

impl From<String> for OptionalBody {
    fn from(text: String) -> Self {
        text.into_bytes().into()
    }
}

impl From<Vec<u8>> for OptionalBody {
    fn from(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            OptionalBody::Empty
        } else {
            OptionalBody::Present(bytes)
        }
    }
}

impl fmt::Display for OptionalBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionalBody::Missing => write!(f, "MISSING"),
            OptionalBody::Empty => write!(f, "EMPTY"),
            OptionalBody::Present(_) => write!(f, "{}", self.to_text()),
        }
    }
}

/// An HTTP request, either received by the mock provider or expected by an interaction.
///
/// Header names are stored lower-cased and both maps are ordered, so two requests compare and
/// hash equal regardless of header casing or the order parameters were added in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    method: String,
    path: String,
    query: BTreeMap<String, Vec<String>>,
    headers: BTreeMap<String, String>,
    body: OptionalBody,
}

impl Request {
    pub fn new<S1: AsRef<str>, S2: Into<String>>(method: S1, path: S2) -> Self {
        Self {
            method: method.as_ref().to_uppercase(),
            path: path.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: OptionalBody::Missing,
        }
    }

    pub fn with_query<S1: Into<String>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.query
            .entry(name.into())
            .or_insert_with(Vec::new)
            .push(value.into());
        self
    }

    /// Adds a header. Adding the same name twice joins the values with `", "`.
    pub fn with_header<S1: AsRef<str>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        let value = value.into();
        match self.headers.entry(name.as_ref().to_lowercase()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
        self
    }

    pub fn with_body<B: Into<OptionalBody>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &BTreeMap<String, Vec<String>> {
        &self.query
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header<S: AsRef<str>>(&self, name: S) -> Option<&str> {
        self.headers
            .get(&name.as_ref().to_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> &OptionalBody {
        &self.body
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\tmethod: {}\n\tpath: {}\n\tquery: {:?}\n\theaders: {:?}\n\tbody: {}",
            self.method, self.path, self.query, self.headers, self.body
        )
    }
}

/// An HTTP response as the mock provider will send it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: OptionalBody,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: OptionalBody::Missing,
        }
    }

    pub fn with_header<S1: Into<String>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.headers
            .entry(name.into())
            .or_insert_with(Vec::new)
            .push(value.into());
        self
    }

    pub fn with_body<B: Into<OptionalBody>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup, values flattened with `", "`.
    pub fn header<S: AsRef<str>>(&self, name: S) -> Option<String> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name.as_ref()))
            .map(|(_, values)| values.join(", "))
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(200)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub description: String,
    pub provider_state: Option<String>,
    pub request: Request,
    pub response: Response,
}

impl Interaction {
    pub fn new<S: Into<String>>(description: S, request: Request, response: Response) -> Self {
        Self {
            description: description.into(),
            provider_state: None,
            request,
            response,
        }
    }

    pub fn given<S: Into<String>>(mut self, provider_state: S) -> Self {
        self.provider_state = Some(provider_state.into());
        self
    }
}

/// The contract between a consumer and a provider: an ordered list of interactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pact {
    pub consumer: String,
    pub provider: String,
    pub interactions: Vec<Interaction>,
}

impl Pact {
    pub fn new<S1: Into<String>, S2: Into<String>>(consumer: S1, provider: S2) -> Self {
        Self {
            consumer: consumer.into(),
            provider: provider.into(),
            interactions: Vec::new(),
        }
    }

    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.interactions.push(interaction);
        self
    }

    /// The file name the pact is persisted under.
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.consumer, self.provider)
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum PactSpecVersion {
    V1,
    V1_1,
    V2,
    #[default]
    V3,
}

impl PactSpecVersion {
    pub fn version_str(self) -> &'static str {
        match self {
            PactSpecVersion::V1 => "1.0.0",
            PactSpecVersion::V1_1 => "1.1.0",
            PactSpecVersion::V2 => "2.0.0",
            PactSpecVersion::V3 => "3.0.0",
        }
    }
}
