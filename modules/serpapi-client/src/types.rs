use serde::{Deserialize, Deserializer};

// --- Section-agnostic review model ---

/// One review-like record from an `amazon_product` payload, tagged by the
/// section it was found in. Every variant exposes its text through
/// [`ReviewSection::text`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewSection {
    AuthorReview(AttributedReview),
    OtherCountryReview(AttributedReview),
    TopReview(AttributedReview),
    InsightExample(InsightExample),
    NativeReview(NativeReview),
}

impl ReviewSection {
    /// The review text, if the record carries one.
    pub fn text(&self) -> Option<&str> {
        match self {
            ReviewSection::AuthorReview(r)
            | ReviewSection::OtherCountryReview(r)
            | ReviewSection::TopReview(r) => r.text.as_deref(),
            ReviewSection::InsightExample(e) => e.snippet.as_deref(),
            ReviewSection::NativeReview(r) => r.text(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ReviewSection::AuthorReview(_) => "authors_reviews",
            ReviewSection::OtherCountryReview(_) => "other_countries_reviews",
            ReviewSection::TopReview(_) => "top_reviews",
            ReviewSection::InsightExample(_) => "insight_example",
            ReviewSection::NativeReview(_) => "reviews",
        }
    }
}

// --- amazon_product engine response ---

/// Response body of `engine=amazon_product`. Only the review-bearing parts
/// are modelled; everything else in the payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductResponse {
    #[serde(default)]
    pub reviews_information: ReviewsInformation,
    #[serde(default)]
    pub reviews: Vec<NativeReview>,
    /// SerpApi reports search-level failures in-band with a 200 status.
    #[serde(default)]
    pub error: Option<String>,
}

impl ProductResponse {
    /// Flatten the payload into review sections, in this order: author
    /// reviews, other-country reviews, top reviews, insight examples,
    /// then the top-level reviews list.
    pub fn sections(self) -> Vec<ReviewSection> {
        let info = self.reviews_information;
        let mut out = Vec::new();

        out.extend(info.authors_reviews.into_iter().map(ReviewSection::AuthorReview));
        out.extend(
            info.other_countries_reviews
                .into_iter()
                .map(ReviewSection::OtherCountryReview),
        );
        out.extend(info.top_reviews.into_iter().map(ReviewSection::TopReview));
        out.extend(
            info.summary
                .insights
                .into_iter()
                .flat_map(|insight| insight.examples)
                .map(ReviewSection::InsightExample),
        );
        out.extend(self.reviews.into_iter().map(ReviewSection::NativeReview));

        out
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewsInformation {
    #[serde(default)]
    pub authors_reviews: Vec<AttributedReview>,
    #[serde(default)]
    pub other_countries_reviews: Vec<AttributedReview>,
    #[serde(default)]
    pub top_reviews: Vec<AttributedReview>,
    #[serde(default)]
    pub summary: ReviewSummary,
}

/// A review as listed under `authors_reviews`, `other_countries_reviews`
/// or `top_reviews`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttributedReview {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// The AI-generated review summary block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewSummary {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub insights: Vec<Insight>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Insight {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub examples: Vec<InsightExample>,
}

/// A quoted excerpt backing a summary insight.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InsightExample {
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// An item of the flat top-level `reviews` list. Depending on the region the
/// text lives under `content` or `body`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NativeReview {
    #[serde(default)]
    pub title: Option<String>,
    /// `None` when the key is absent, `Some(None)` when it is `null`.
    #[serde(default, deserialize_with = "present")]
    pub content: Option<Option<String>>,
    #[serde(default)]
    pub body: Option<String>,
}

impl NativeReview {
    /// `body` is consulted only when the payload has no `content` key at all;
    /// a `null` content means the review has no text.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Some(content) => content.as_deref(),
            None => self.body.as_deref(),
        }
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
