//! Canned replies used when no generated answer is available.

const SCHEMES: &str = "🌾 **Government Schemes for Farmers**

Here are some important schemes available for farmers:

1. **PM-KISAN (Pradhan Mantri Kisan Samman Nidhi)**
   - ₹6,000 per year in 3 installments
   - For all landholding farmer families
   - Apply at: https://pmkisan.gov.in

2. **Kisan Credit Card (KCC)**
   - Low-interest agricultural loans
   - Insurance coverage included

3. **PM Fasal Bima Yojana**
   - Crop insurance scheme
   - Protection against natural calamities

📋 For Karnataka-specific schemes, visit: https://raitamitra.karnataka.gov.in/english

Note: This is a demo response. For personalized assistance, please configure valid GCP credentials.";

const WEATHER: &str = "🌤️ **Weather Information**

For accurate weather forecasts for your area, please check:
- IMD: https://mausam.imd.gov.in
- Skymet: https://www.skymetweather.com

Note: This is a demo response. Configure GCP credentials for live weather data.";

const MARKET: &str = "📊 **Market Price Information**

Check current agricultural commodity prices at:
- Agmarknet: https://agmarknet.gov.in
- eNAM: https://enam.gov.in

Note: This is a demo response. Configure GCP credentials for live market data.";

const PLANT_HEALTH: &str = "🌱 **Plant Health Assistance**

For plant disease diagnosis:
1. Take clear photos of affected parts
2. Note the symptoms you observe
3. Check soil moisture and recent weather

Common resources:
- ICAR Portal: https://icar.org.in
- Plantix App for disease identification

Note: This is a demo response. Configure GCP credentials for AI-powered diagnosis.";

/// Topics checked in order; the first with a matching keyword wins.
const TOPICS: &[(&[&str], &str)] = &[
    (&["scheme", "yojana", "subsidy", "pm kisan"], SCHEMES),
    (&["weather", "rain", "temperature", "forecast"], WEATHER),
    (&["price", "market", "mandi", "rate"], MARKET),
    (&["disease", "pest", "leaf", "plant", "crop"], PLANT_HEALTH),
];

fn greeting(query: &str) -> String {
    format!(
        "🙏 **Namaskara! Welcome to KisanVaani**

I'm your AI farming assistant. I can help you with:

• 🏛️ Government schemes and subsidies
• 🌤️ Weather forecasts
• 📊 Market prices
• 🌱 Plant disease diagnosis

Your query: \"{query}\"

Note: This is a demo response. For full AI-powered assistance, please configure valid GCP credentials in the backend.

Try asking about:
- \"What schemes are available for farmers?\"
- \"What is the weather forecast?\"
- \"Current tomato prices\"
"
    )
}

/// Pick a canned reply by keyword, falling back to a greeting that echoes `query`.
pub fn demo_response(query: &str) -> String {
    let lower = query.to_lowercase();
    TOPICS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, reply)| (*reply).to_string())
        .unwrap_or_else(|| greeting(query))
}
