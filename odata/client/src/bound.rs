//! Typed entity set access.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::client::ODataClient;
use crate::error::ODataError;
use crate::literal::{Literal, render};
use crate::traits::{EntityKey, OpenType};

type Attach<T> = fn(&mut T, &Map<String, Value>);

/// System query options of a [`BoundClient`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub top: Option<u64>,
    pub skip: Option<u64>,
    pub filter: Option<String>,
    pub order_by: Option<String>,
    pub select: Vec<String>,
}

impl QueryOptions {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `(name, value)` pairs in a stable order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(filter) = &self.filter {
            pairs.push(("$filter", filter.clone()));
        }
        if let Some(order_by) = &self.order_by {
            pairs.push(("$orderby", order_by.clone()));
        }
        if !self.select.is_empty() {
            pairs.push(("$select", self.select.join(",")));
        }
        if let Some(skip) = self.skip {
            pairs.push(("$skip", skip.to_string()));
        }
        if let Some(top) = self.top {
            pairs.push(("$top", top.to_string()));
        }
        pairs
    }
}

/// Queries against one entity set, deserialized as `T`.
///
/// Builder methods consume and return the client, so a facade accessor can
/// be refined inline:
///
/// ```rust,ignore
/// let people = service
///     .People()
///     .filter("FirstName eq 'Scott'")
///     .top(10)
///     .find_entries()
///     .await?;
/// ```
pub struct BoundClient<T> {
    client: ODataClient,
    set: String,
    options: QueryOptions,
    attach: Option<Attach<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BoundClient<T> {
    pub(crate) fn new(client: ODataClient, set: &str) -> Self {
        Self {
            client,
            set: set.to_string(),
            options: QueryOptions::default(),
            attach: None,
            _marker: PhantomData,
        }
    }

    pub fn set_name(&self) -> &str {
        &self.set
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// `$top`: at most `n` entries.
    pub fn top(mut self, n: u64) -> Self {
        self.options.top = Some(n);
        self
    }

    /// `$skip`: skip the first `n` entries.
    pub fn skip(mut self, n: u64) -> Self {
        self.options.skip = Some(n);
        self
    }

    /// `$filter` expression, passed through verbatim.
    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.options.filter = Some(expression.into());
        self
    }

    /// `$orderby` expression, passed through verbatim.
    pub fn order_by(mut self, expression: impl Into<String>) -> Self {
        self.options.order_by = Some(expression.into());
        self
    }

    /// `$select`: restrict the returned properties.
    pub fn select<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.select = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Copies undeclared payload properties into each entry's dynamic
    /// property map.
    pub fn with_properties(mut self) -> Self
    where
        T: OpenType,
    {
        self.attach = Some(attach_dynamic::<T>);
        self
    }

    fn url(&self, segment: &str) -> Result<url::Url, ODataError> {
        let mut url = self.client.resource_url(segment)?;
        if !self.options.is_empty() {
            url.query_pairs_mut().extend_pairs(self.options.pairs());
        }
        Ok(url)
    }

    fn decode(&self, value: Value) -> Result<T, ODataError>
    where
        T: DeserializeOwned,
    {
        let mut entry = T::deserialize(&value)?;
        if let (Some(attach), Value::Object(map)) = (self.attach, &value) {
            attach(&mut entry, map);
        }
        Ok(entry)
    }
}

impl<T: DeserializeOwned> BoundClient<T> {
    /// Fetches the entries of the set, honouring the query options.
    ///
    /// ## Errors
    ///
    /// Returns an error if the request fails, the service answers with an
    /// error status or the payload has no `value` array.
    pub async fn find_entries(&self) -> Result<Vec<T>, ODataError> {
        let url = self.url(&self.set)?;
        let payload = self.client.get_json(url).await?;

        let Value::Object(mut map) = payload else {
            return Err(ODataError::UnexpectedPayload(
                "expected an object with a 'value' array".to_string(),
            ));
        };
        let Some(Value::Array(entries)) = map.remove("value") else {
            return Err(ODataError::UnexpectedPayload(
                "missing 'value' array".to_string(),
            ));
        };

        debug!(set = %self.set, count = entries.len(), "entries received");
        entries.into_iter().map(|entry| self.decode(entry)).collect()
    }

    /// Fetches the entry with the given key.
    ///
    /// A scalar key addresses a single-property key (`People('russell')`);
    /// a struct or map serializing to an object addresses a composite key
    /// (`Lines(OrderId=1,LineNo=2)`).
    ///
    /// ## Errors
    ///
    /// Returns [`ODataError::Parameter`] if a scalar key is given for an
    /// entity with a composite key, or if a key value has no literal form.
    pub async fn find_entry(&self, key: impl Serialize) -> Result<T, ODataError>
    where
        T: EntityKey,
    {
        let predicate = key_predicate::<T, _>(&key)?;
        let segment = format!("{}({})", self.set, predicate);
        let url = self.url(&segment)?;
        let payload = self.client.get_json(url).await?;
        self.decode(payload)
    }
}

impl<T> Clone for BoundClient<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            set: self.set.clone(),
            options: self.options.clone(),
            attach: self.attach,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for BoundClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundClient")
            .field("set", &self.set)
            .field("options", &self.options)
            .field("with_properties", &self.attach.is_some())
            .finish()
    }
}

fn key_predicate<T: EntityKey, K: Serialize + ?Sized>(key: &K) -> Result<String, ODataError> {
    let invalid = |message: String| ODataError::Parameter {
        name: T::KEY_PROPERTIES.join(","),
        message,
    };
    match render(key).map_err(|e| invalid(e.to_string()))? {
        Literal::Record(parts) => Ok(parts
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(",")),
        Literal::Scalar(scalar) if T::KEY_PROPERTIES.len() > 1 => Err(invalid(format!(
            "composite key needs all of its properties, got {scalar}"
        ))),
        Literal::Scalar(scalar) => Ok(scalar),
    }
}

fn attach_dynamic<T: OpenType>(entry: &mut T, payload: &Map<String, Value>) {
    let declared = T::declared_properties();
    let dynamic = entry.dynamic_properties_mut();
    for (name, value) in payload {
        if name.contains('@') || declared.contains(&name.as_str()) {
            continue;
        }
        dynamic.insert(name.clone(), value.clone());
    }
}
