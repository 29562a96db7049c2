//! Places API request and response types.
//!
//! Outbound shapes mirror the subset of the Places API (New) the browser
//! uses, so the client-side code can read `suggestions[].placePrediction`
//! whichever endpoint produced them.

use serde::{Deserialize, Serialize};

use nearby_core::Coordinates;

/// Text with optional formatting metadata (only `text` is kept).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattableText {
    pub text: String,
}

/// Main/secondary split of a prediction, e.g. street and city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredFormat {
    pub main_text: FormattableText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_text: Option<FormattableText>,
}

/// A predicted place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacePrediction {
    pub place_id: String,
    pub text: FormattableText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_format: Option<StructuredFormat>,
}

/// One autocomplete or text-search suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub place_prediction: PlacePrediction,
}

/// Location and address of a selected place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    pub location: Coordinates,
    pub formatted_address: String,
}

// =============================================================================
// Raw API responses
// =============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct AutocompleteResponse {
    #[serde(default)]
    pub suggestions: Vec<RawSuggestion>,
}

/// Query predictions carry no `placePrediction` and are dropped.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawSuggestion {
    pub place_prediction: Option<PlacePrediction>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TextSearchResponse {
    #[serde(default)]
    pub places: Vec<TextSearchPlace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TextSearchPlace {
    pub id: String,
    pub formatted_address: Option<String>,
    pub display_name: Option<FormattableText>,
}

impl TextSearchPlace {
    /// Present a text-search hit in the autocomplete shape.
    pub fn into_suggestion(self) -> Suggestion {
        let address = self.formatted_address.unwrap_or_default();
        let (text, structured_format) = match self.display_name {
            Some(name) if !name.text.is_empty() && name.text != address => (
                if address.is_empty() {
                    name.text.clone()
                } else {
                    format!("{}, {address}", name.text)
                },
                Some(StructuredFormat {
                    main_text: name,
                    secondary_text: (!address.is_empty()).then(|| FormattableText {
                        text: address.clone(),
                    }),
                }),
            ),
            _ => (address, None),
        };

        Suggestion {
            place_prediction: PlacePrediction {
                place_id: self.id,
                text: FormattableText { text },
                structured_format,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DetailsResponse {
    pub location: Option<LatLng>,
    pub formatted_address: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(super) struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_autocomplete_drops_query_predictions() {
        let raw = r#"{
            "suggestions": [
                {"placePrediction": {
                    "place": "places/abc",
                    "placeId": "abc",
                    "text": {"text": "1 Water St, Vancouver, BC", "matches": []},
                    "structuredFormat": {
                        "mainText": {"text": "1 Water St"},
                        "secondaryText": {"text": "Vancouver, BC"}
                    }
                }},
                {"queryPrediction": {"text": {"text": "water street cafes"}}}
            ]
        }"#;
        let parsed: AutocompleteResponse = serde_json::from_str(raw).unwrap();
        let kept: Vec<_> = parsed
            .suggestions
            .into_iter()
            .filter_map(|s| s.place_prediction)
            .collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].place_id, "abc");
    }

    #[test]
    fn test_empty_autocomplete_body() {
        let parsed: AutocompleteResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.suggestions.is_empty());
    }

    #[test]
    fn test_text_search_place_becomes_suggestion() {
        let place = TextSearchPlace {
            id: "xyz".to_string(),
            formatted_address: Some("9 Stephen Ave, Calgary".to_string()),
            display_name: Some(FormattableText {
                text: "Saddlery".to_string(),
            }),
        };
        let json = serde_json::to_value(place.into_suggestion()).unwrap();
        assert_eq!(json["placePrediction"]["placeId"], "xyz");
        assert_eq!(
            json["placePrediction"]["text"]["text"],
            "Saddlery, 9 Stephen Ave, Calgary"
        );
        assert_eq!(
            json["placePrediction"]["structuredFormat"]["mainText"]["text"],
            "Saddlery"
        );
    }

    #[test]
    fn test_details_serialize_shape() {
        let details = PlaceDetails {
            location: Coordinates {
                lat: 49.2827,
                lng: -123.1207,
            },
            formatted_address: "Vancouver, BC".to_string(),
        };
        let json = serde_json::to_value(details).unwrap();
        assert_eq!(json["formattedAddress"], "Vancouver, BC");
        assert_eq!(json["location"]["lat"], 49.2827);
    }
}
