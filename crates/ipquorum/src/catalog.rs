use {
    derive_more::{Debug, Display},
    serde::{Serialize, Serializer},
    smallvec::SmallVec,
    std::{borrow::Cow, str::FromStr, sync::Arc},
    strum::{EnumCount, VariantArray},
    strum_macros::{
        AsRefStr, EnumCount, EnumIter, EnumString, IntoStaticStr, VariantArray, VariantNames,
    },
};

/// Opaque identifier of one catalog entry: the URL that is queried.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Display)]
#[debug("{_0}")]
#[display("{_0}")]
pub struct EndpointRef(Arc<str>);

impl EndpointRef {
    pub fn new(url: impl AsRef<str>) -> Self {
        Self(Arc::from(url.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EndpointRef {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl Serialize for EndpointRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// How the value is extracted from a response body.
#[derive(Clone, PartialEq, Eq, Debug, Display)]
pub enum ResponseShape {
    /// The whole body, trimmed.
    #[display("raw")]
    Raw,
    /// The named field of a JSON object, trimmed.
    #[display("field {_0:?}")]
    FieldOf(Cow<'static, str>),
}

#[derive(Clone, PartialEq, Eq, Debug, Display, getset::Getters)]
#[display("{endpoint} ({shape})")]
#[debug("{endpoint}")]
pub struct CatalogEntry {
    #[getset(get = "pub")]
    endpoint: EndpointRef,

    #[getset(get = "pub")]
    shape: ResponseShape,
}

impl CatalogEntry {
    pub fn new(endpoint: EndpointRef, shape: ResponseShape) -> Self {
        Self { endpoint, shape }
    }

    pub fn raw(url: impl AsRef<str>) -> Self {
        Self::new(EndpointRef::new(url), ResponseShape::Raw)
    }

    pub fn field_of(url: impl AsRef<str>, key: impl Into<Cow<'static, str>>) -> Self {
        Self::new(EndpointRef::new(url), ResponseShape::FieldOf(key.into()))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum CatalogEntryError {
    #[display("endpoint URL is empty")]
    EmptyUrl,
    #[display("field name after '#' is empty")]
    EmptyField,
}

impl std::error::Error for CatalogEntryError {}

/// Parses `URL` as a raw endpoint and `URL#key` as a JSON one.
impl FromStr for CatalogEntry {
    type Err = CatalogEntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (url, key) = match s.trim().rsplit_once('#') {
            Some((url, key)) => (url.trim(), Some(key.trim())),
            None => (s.trim(), None),
        };

        if url.is_empty() {
            return Err(CatalogEntryError::EmptyUrl);
        }

        match key {
            None => Ok(Self::raw(url)),
            Some("") => Err(CatalogEntryError::EmptyField),
            Some(key) => Ok(Self::field_of(url, key.to_owned())),
        }
    }
}

/// Built-in public lookup services.
#[derive(
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    Debug,
    Display,
    EnumIter,
    EnumCount,
    VariantArray,
    VariantNames,
    EnumString,
    IntoStaticStr,
    AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Provider {
    #[display("httpbin.org")]
    HttpBin,
    #[display("ipify.org")]
    Ipify,
    #[display("icanhazip.com")]
    Icanhazip,
    #[display("ifconfig.me")]
    IfconfigMe,
    #[display("ifconfig.co")]
    IfconfigCo,
    #[display("ipinfo.io")]
    IpinfoIo,
    #[display("ident.me")]
    IdentMe,
    #[display("checkip.amazonaws.com")]
    AmazonAws,
    #[display("myip.com")]
    MyIp,
    #[display("ipapi.co")]
    IpapiCo,
    #[display("seeip.org")]
    SeeIp,
    #[display("ipecho.net")]
    IpEcho,
    #[display("wtfismyip.com")]
    WtfIsMyIp,
    #[display("myexternalip.com")]
    MyExternalIp,
    #[display("iplocation.net")]
    IpLocation,
    #[display("bigdatacloud.net")]
    BigDataCloud,
    #[display("ipquery.io")]
    IpQuery,
    #[display("trackip.net")]
    TrackIp,
}

impl Provider {
    pub const fn request_uri(&self) -> &'static str {
        match self {
            Self::HttpBin => "https://httpbin.org/ip",
            Self::Ipify => "https://api.ipify.org",
            Self::Icanhazip => "https://ipv4.icanhazip.com",
            Self::IfconfigMe => "https://ifconfig.me/ip",
            Self::IfconfigCo => "https://ifconfig.co/json",
            Self::IpinfoIo => "https://ipinfo.io/ip",
            Self::IdentMe => "https://v4.ident.me",
            Self::AmazonAws => "https://checkip.amazonaws.com",
            Self::MyIp => "https://api.myip.com",
            Self::IpapiCo => "https://ipapi.co/ip",
            Self::SeeIp => "https://api.seeip.org/jsonip",
            Self::IpEcho => "https://ipecho.net/plain",
            Self::WtfIsMyIp => "https://wtfismyip.com/json",
            Self::MyExternalIp => "https://myexternalip.com/raw",
            Self::IpLocation => "https://api.iplocation.net/?cmd=get-ip",
            Self::BigDataCloud => "https://api-bdc.net/data/client-ip",
            Self::IpQuery => "https://api.ipquery.io",
            Self::TrackIp => "https://www.trackip.net/ip",
        }
    }

    pub const fn response_field(&self) -> Option<&'static str> {
        match self {
            Self::HttpBin => Some("origin"),
            Self::IfconfigCo | Self::MyIp | Self::SeeIp | Self::IpLocation => Some("ip"),
            Self::WtfIsMyIp => Some("YourFuckingIPAddress"),
            Self::BigDataCloud => Some("ipString"),
            _ => None,
        }
    }

    pub fn response_shape(&self) -> ResponseShape {
        match self.response_field() {
            Some(key) => ResponseShape::FieldOf(Cow::Borrowed(key)),
            None => ResponseShape::Raw,
        }
    }

    pub fn entry(&self) -> CatalogEntry {
        CatalogEntry::new(EndpointRef::new(self.request_uri()), self.response_shape())
    }
}

/// Ordered list of endpoints a race is run against.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: SmallVec<[CatalogEntry; Provider::COUNT]>,
}

impl Catalog {
    /// Every built-in [Provider], in declaration order.
    pub fn builtin() -> Self {
        Self::builtin_except(&[])
    }

    /// Built-in providers without the `disabled` ones.
    pub fn builtin_except(disabled: &[Provider]) -> Self {
        Provider::VARIANTS
            .iter()
            .filter(|provider| !disabled.contains(*provider))
            .map(Provider::entry)
            .collect()
    }

    pub fn push(&mut self, entry: CatalogEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<T: IntoIterator<Item = CatalogEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<CatalogEntry> for Catalog {
    fn extend<T: IntoIterator<Item = CatalogEntry>>(&mut self, iter: T) {
        self.entries.extend(iter)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_keeps_declaration_order() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), Provider::COUNT);

        let first = catalog.iter().next().unwrap();
        assert_eq!(first.endpoint().as_str(), "https://httpbin.org/ip");
        assert_eq!(first.shape(), &ResponseShape::FieldOf("origin".into()));
    }

    #[test]
    fn builtin_except_drops_disabled() {
        let catalog = Catalog::builtin_except(&[Provider::HttpBin, Provider::Ipify]);
        assert_eq!(catalog.len(), Provider::COUNT - 2);
        assert!(
            catalog
                .iter()
                .all(|e| e.endpoint().as_str() != Provider::Ipify.request_uri())
        );
    }

    #[test]
    fn provider_names_are_kebab_case() {
        assert_eq!("http-bin".parse::<Provider>().unwrap(), Provider::HttpBin);
        assert_eq!(Provider::AmazonAws.as_ref(), "amazon-aws");
        assert!("HttpBin".parse::<Provider>().is_err());
    }

    #[test]
    fn entry_from_str() {
        let raw: CatalogEntry = "https://example.net/ip".parse().unwrap();
        assert_eq!(raw.shape(), &ResponseShape::Raw);

        let json: CatalogEntry = "https://example.net/json#address".parse().unwrap();
        assert_eq!(json.endpoint().as_str(), "https://example.net/json");
        assert_eq!(json.shape(), &ResponseShape::FieldOf("address".into()));

        assert_eq!("".parse::<CatalogEntry>(), Err(CatalogEntryError::EmptyUrl));
        assert_eq!(
            "https://example.net/json#".parse::<CatalogEntry>(),
            Err(CatalogEntryError::EmptyField)
        );
    }

    #[test]
    fn endpoint_serializes_as_url() {
        let endpoint = EndpointRef::new("https://example.net");
        assert_eq!(
            serde_json::to_string(&endpoint).unwrap(),
            "\"https://example.net\""
        );
    }
}
