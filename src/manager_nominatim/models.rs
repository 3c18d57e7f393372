use serde::Deserialize;

#[derive(Deserialize, Default)]
pub struct Address {
    pub village: Option<String>,
    pub town: Option<String>,
    pub city: Option<String>,
}

impl Address {
    /// The most local populated place name available
    pub fn place_name(self) -> Option<String> {
        [self.village, self.town, self.city]
            .into_iter()
            .flatten()
            .find(|name| !name.trim().is_empty())
    }
}

#[derive(Deserialize)]
pub struct ReverseResult {
    pub address: Option<Address>,
}
