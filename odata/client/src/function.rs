//! Service-level (unbound) function calls.
//!
//! Scalar parameters are written inline as URL literals. Parameters without a
//! literal form (complex values, collections) are passed as parameter aliases:
//! `Find(filter=@filter)?@filter={"Name":"x"}` with the value as JSON.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::ODataClient;
use crate::error::ODataError;
use crate::literal::{Literal, LiteralError, render};

/// Entry point for operations invoked at the service root.
#[derive(Debug, Clone)]
pub struct UnboundClient {
    client: ODataClient,
}

impl UnboundClient {
    pub(crate) fn new(client: ODataClient) -> Self {
        Self { client }
    }

    /// Starts a call to the function `name`.
    pub fn function(&self, name: &str) -> FunctionCall {
        FunctionCall {
            client: self.client.clone(),
            name: name.to_string(),
            parameters: Vec::new(),
        }
    }
}

/// How one parameter value travels.
#[derive(Debug, Clone, PartialEq)]
enum Argument {
    /// URL literal inside the parentheses.
    Inline(String),
    /// JSON text bound to an `@name` alias in the query string.
    Alias(String),
}

impl Argument {
    fn new<V: Serialize + ?Sized>(value: &V) -> Result<Self, String> {
        match render(value) {
            Ok(Literal::Scalar(text)) => Ok(Self::Inline(text)),
            Ok(Literal::Record(_)) | Err(LiteralError::Structured) => serde_json::to_string(value)
                .map(Self::Alias)
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// A function call being assembled.
///
/// Parameter errors are kept until the call is executed so that generated
/// code can chain `.parameter(..)` without intermediate `?`.
#[derive(Debug)]
pub struct FunctionCall {
    client: ODataClient,
    name: String,
    parameters: Vec<(String, Result<Argument, String>)>,
}

impl FunctionCall {
    /// Adds a parameter, written as an OData URL literal when it has one and
    /// as a JSON parameter alias otherwise.
    pub fn parameter(mut self, name: &str, value: impl Serialize) -> Self {
        let argument = Argument::new(&value);
        self.parameters.push((name.to_string(), argument));
        self
    }

    fn arguments(&self) -> Result<Vec<(&str, &Argument)>, ODataError> {
        self.parameters
            .iter()
            .map(|(name, argument)| match argument {
                Ok(argument) => Ok((name.as_str(), argument)),
                Err(message) => Err(ODataError::Parameter {
                    name: name.clone(),
                    message: message.clone(),
                }),
            })
            .collect()
    }

    /// The resource path segment, `Name(p1=v1,p2=@p2)`.
    ///
    /// ## Errors
    ///
    /// Returns the first parameter error, if any.
    pub fn segment(&self) -> Result<String, ODataError> {
        let parts: Vec<String> = self
            .arguments()?
            .into_iter()
            .map(|(name, argument)| match argument {
                Argument::Inline(literal) => format!("{name}={literal}"),
                Argument::Alias(_) => format!("{name}=@{name}"),
            })
            .collect();
        Ok(format!("{}({})", self.name, parts.join(",")))
    }

    /// Alias query pairs, `("@name", json)`, in call order.
    ///
    /// ## Errors
    ///
    /// Returns the first parameter error, if any.
    pub fn aliases(&self) -> Result<Vec<(String, String)>, ODataError> {
        Ok(self
            .arguments()?
            .into_iter()
            .filter_map(|(name, argument)| match argument {
                Argument::Alias(json) => Some((format!("@{name}"), json.clone())),
                Argument::Inline(_) => None,
            })
            .collect())
    }

    async fn execute(&self) -> Result<Value, ODataError> {
        let mut url = self.client.resource_url(&self.segment()?)?;
        let aliases = self.aliases()?;
        if !aliases.is_empty() {
            url.query_pairs_mut().extend_pairs(aliases);
        }
        self.client.get_json(url).await
    }

    /// Executes a function returning one value (entity, complex or primitive).
    ///
    /// A payload whose only non-annotation property is `value` is unwrapped,
    /// which is how services return primitive and collection results.
    ///
    /// ## Errors
    ///
    /// Returns an error if a parameter is invalid, the request fails or the
    /// payload does not deserialize as `T`.
    pub async fn execute_as_single<T: DeserializeOwned>(self) -> Result<T, ODataError> {
        let payload = unwrap_value(self.execute().await?);
        Ok(serde_json::from_value(payload)?)
    }

    /// Executes a function returning a collection.
    ///
    /// ## Errors
    ///
    /// Returns [`ODataError::UnexpectedPayload`] if the payload holds no
    /// array, plus the errors of [`FunctionCall::execute_as_single`].
    pub async fn execute_as_array<T: DeserializeOwned>(self) -> Result<Vec<T>, ODataError> {
        match unwrap_value(self.execute().await?) {
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).map_err(ODataError::from))
                .collect(),
            other => Err(ODataError::UnexpectedPayload(format!(
                "expected an array, got {other}"
            ))),
        }
    }
}

/// Unwraps `{"@odata.context": .., "value": X}` to `X`.
fn unwrap_value(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) => {
            let only_value = map.contains_key("value")
                && map.keys().filter(|k| !k.contains('@')).count() == 1;
            match map.remove("value") {
                Some(value) if only_value => value,
                Some(value) => {
                    map.insert("value".to_string(), value);
                    Value::Object(map)
                }
                None => Value::Object(map),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct AirportInfo {
        #[serde(rename = "IcaoCode")]
        icao_code: String,
    }

    #[derive(Debug, serde::Serialize)]
    struct Area {
        #[serde(rename = "City")]
        city: String,
        #[serde(rename = "Radius")]
        radius: f64,
    }

    fn client() -> ODataClient {
        ODataClient::new("https://example.com/odata/").unwrap()
    }

    #[test]
    fn segment_lists_parameters_in_call_order() {
        let call = client()
            .unbound()
            .function("GetNearestAirport")
            .parameter("lat", 33.5)
            .parameter("lon", -118.25);
        assert_eq!(call.segment().unwrap(), "GetNearestAirport(lat=33.5,lon=-118.25)");
    }

    #[test]
    fn segment_without_parameters_keeps_parentheses() {
        let call = client().unbound().function("GetPersonWithMostFriends");
        assert_eq!(call.segment().unwrap(), "GetPersonWithMostFriends()");
    }

    #[test]
    fn invalid_parameter_surfaces_on_segment() {
        let mut lookup = BTreeMap::new();
        lookup.insert(vec![1_u8], 1);
        let call = client()
            .unbound()
            .function("Find")
            .parameter("lookup", lookup);

        let err = call.segment().unwrap_err();
        assert!(matches!(err, ODataError::Parameter { ref name, .. } if name == "lookup"));
        assert!(call.aliases().is_err());
    }

    #[test]
    fn structured_parameters_become_aliases() {
        let call = client()
            .unbound()
            .function("Find")
            .parameter("ids", vec![1, 2])
            .parameter("name", "x")
            .parameter("area", Area { city: "Paris".to_string(), radius: 2.5 });

        assert_eq!(call.segment().unwrap(), "Find(ids=@ids,name='x',area=@area)");
        assert_eq!(
            call.aliases().unwrap(),
            vec![
                ("@ids".to_string(), "[1,2]".to_string()),
                ("@area".to_string(), r#"{"City":"Paris","Radius":2.5}"#.to_string()),
            ]
        );
    }

    #[test]
    fn guid_parameter_is_inline_and_unquoted() {
        let id: crate::Guid = "21ec2020-3aea-4069-a2dd-08002b30309d".parse().unwrap();
        let call = client().unbound().function("Outcome").parameter("id", id);
        assert_eq!(
            call.segment().unwrap(),
            "Outcome(id=21ec2020-3aea-4069-a2dd-08002b30309d)"
        );
        assert!(call.aliases().unwrap().is_empty());
    }

    #[test]
    fn unwrap_value_only_for_lone_value() {
        let primitive = serde_json::json!({"@odata.context": "$metadata#Edm.Int32", "value": 7});
        assert_eq!(unwrap_value(primitive), serde_json::json!(7));

        let complex = serde_json::json!({"value": 1, "unit": "m"});
        assert_eq!(unwrap_value(complex.clone()), complex);
    }

    #[tokio::test]
    async fn execute_as_single_reads_complex_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/GetNearestAirport(lat=33.5,lon=-118.25)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "@odata.context": "$metadata#Trippin.AirportInfo",
                "IcaoCode": "KLAX"
            })))
            .mount(&server)
            .await;

        let client = ODataClient::new(&server.uri()).unwrap();
        let airport: AirportInfo = client
            .unbound()
            .function("GetNearestAirport")
            .parameter("lat", 33.5)
            .parameter("lon", -118.25)
            .execute_as_single()
            .await
            .unwrap();
        assert_eq!(airport.icao_code, "KLAX");
    }

    #[tokio::test]
    async fn execute_as_array_reads_value_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/GetCodes(prefix='K''')"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": ["KLAX", "KSFO"]
            })))
            .mount(&server)
            .await;

        let client = ODataClient::new(&server.uri()).unwrap();
        let codes: Vec<String> = client
            .unbound()
            .function("GetCodes")
            .parameter("prefix", "K'")
            .execute_as_array()
            .await
            .unwrap();
        assert_eq!(codes, vec!["KLAX", "KSFO"]);
    }

    #[tokio::test]
    async fn complex_parameter_is_sent_as_alias() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/FindAirports(area=@area,limit=3)"))
            .and(query_param("@area", r#"{"City":"Paris","Radius":2.5}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{"IcaoCode": "LFPG"}, {"IcaoCode": "LFPO"}]
            })))
            .mount(&server)
            .await;

        let client = ODataClient::new(&server.uri()).unwrap();
        let airports: Vec<AirportInfo> = client
            .unbound()
            .function("FindAirports")
            .parameter("area", Area { city: "Paris".to_string(), radius: 2.5 })
            .parameter("limit", 3)
            .execute_as_array()
            .await
            .unwrap();
        assert_eq!(airports.len(), 2);
        assert_eq!(airports[1].icao_code, "LFPO");
    }

    #[tokio::test]
    async fn execute_as_array_rejects_scalar() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 3})))
            .mount(&server)
            .await;

        let client = ODataClient::new(&server.uri()).unwrap();
        let err = client
            .unbound()
            .function("Count")
            .execute_as_array::<i32>()
            .await
            .unwrap_err();
        assert!(matches!(err, ODataError::UnexpectedPayload(_)));
    }
}
