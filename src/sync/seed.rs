use super::orchestrator::SyncService;
use crate::core::{Currency, FetchLogEntry, MetalKind};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const FALLBACK_GOLD_PRICE: f64 = 2750.0;
pub const FALLBACK_SILVER_PRICE: f64 = 30.0;

/// Display metadata for one seeded currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
}

const fn entry(code: &'static str, name: &'static str, symbol: &'static str) -> CatalogEntry {
    CatalogEntry { code, name, symbol }
}

/// Every currency the rate table is expected to cover.
pub const CURRENCY_CATALOG: &[CatalogEntry] = &[
    // Majors
    entry("USD", "US Dollar", "$"),
    entry("EUR", "Euro", "€"),
    entry("GBP", "British Pound", "£"),
    entry("JPY", "Japanese Yen", "¥"),
    entry("CHF", "Swiss Franc", "Fr"),
    entry("CAD", "Canadian Dollar", "C$"),
    entry("AUD", "Australian Dollar", "A$"),
    entry("NZD", "New Zealand Dollar", "NZ$"),
    entry("CNY", "Chinese Yuan", "¥"),
    entry("HKD", "Hong Kong Dollar", "HK$"),
    entry("SGD", "Singapore Dollar", "S$"),
    entry("INR", "Indian Rupee", "₹"),

    // Europe
    entry("SEK", "Swedish Krona", "kr"),
    entry("NOK", "Norwegian Krone", "kr"),
    entry("DKK", "Danish Krone", "kr"),
    entry("PLN", "Polish Zloty", "zł"),
    entry("CZK", "Czech Koruna", "Kč"),
    entry("HUF", "Hungarian Forint", "Ft"),
    entry("RON", "Romanian Leu", "lei"),
    entry("BGN", "Bulgarian Lev", "лв"),
    entry("HRK", "Croatian Kuna", "kn"),
    entry("RSD", "Serbian Dinar", "дин."),
    entry("BAM", "Bosnia-Herzegovina Convertible Mark", "KM"),
    entry("MKD", "Macedonian Denar", "ден"),
    entry("ALL", "Albanian Lek", "L"),
    entry("MDL", "Moldovan Leu", "L"),
    entry("ISK", "Icelandic Krona", "kr"),
    entry("RUB", "Russian Ruble", "₽"),
    entry("UAH", "Ukrainian Hryvnia", "₴"),
    entry("BYN", "Belarusian Ruble", "Br"),
    entry("BYR", "Belarusian Ruble (old)", "Br"),
    entry("GEL", "Georgian Lari", "₾"),
    entry("AMD", "Armenian Dram", "֏"),
    entry("AZN", "Azerbaijani Manat", "₼"),
    entry("LTL", "Lithuanian Litas", "Lt"),
    entry("LVL", "Latvian Lats", "Ls"),
    entry("GGP", "Guernsey Pound", "£"),
    entry("GIP", "Gibraltar Pound", "£"),
    entry("IMP", "Isle of Man Pound", "£"),
    entry("JEP", "Jersey Pound", "£"),
    entry("FKP", "Falkland Islands Pound", "£"),
    entry("SHP", "Saint Helena Pound", "£"),

    // Middle East
    entry("AED", "United Arab Emirates Dirham", "د.إ"),
    entry("SAR", "Saudi Riyal", "﷼"),
    entry("QAR", "Qatari Riyal", "﷼"),
    entry("KWD", "Kuwaiti Dinar", "د.ك"),
    entry("BHD", "Bahraini Dinar", ".د.ب"),
    entry("OMR", "Omani Rial", "﷼"),
    entry("JOD", "Jordanian Dinar", "د.ا"),
    entry("LBP", "Lebanese Pound", "ل.ل"),
    entry("ILS", "Israeli New Shekel", "₪"),
    entry("IRR", "Iranian Rial", "﷼"),
    entry("IQD", "Iraqi Dinar", "ع.د"),
    entry("SYP", "Syrian Pound", "£S"),
    entry("YER", "Yemeni Rial", "﷼"),

    // Africa
    entry("ZAR", "South African Rand", "R"),
    entry("EGP", "Egyptian Pound", "E£"),
    entry("NGN", "Nigerian Naira", "₦"),
    entry("MAD", "Moroccan Dirham", "د.م."),
    entry("DZD", "Algerian Dinar", "د.ج"),
    entry("TND", "Tunisian Dinar", "د.ت"),
    entry("LYD", "Libyan Dinar", "ل.د"),
    entry("SDG", "Sudanese Pound", "£"),
    entry("KES", "Kenyan Shilling", "KSh"),
    entry("UGX", "Ugandan Shilling", "USh"),
    entry("TZS", "Tanzanian Shilling", "TSh"),
    entry("GHS", "Ghanaian Cedi", "₵"),
    entry("XOF", "West African CFA Franc", "CFA"),
    entry("XAF", "Central African CFA Franc", "FCFA"),
    entry("ETB", "Ethiopian Birr", "Br"),
    entry("RWF", "Rwandan Franc", "FRw"),
    entry("BIF", "Burundian Franc", "FBu"),
    entry("DJF", "Djiboutian Franc", "Fdj"),
    entry("KMF", "Comorian Franc", "CF"),
    entry("CDF", "Congolese Franc", "FC"),
    entry("GNF", "Guinean Franc", "FG"),
    entry("MGA", "Malagasy Ariary", "Ar"),
    entry("MUR", "Mauritian Rupee", "₨"),
    entry("SCR", "Seychellois Rupee", "₨"),
    entry("MWK", "Malawian Kwacha", "MK"),
    entry("ZMW", "Zambian Kwacha", "ZK"),
    entry("ZMK", "Zambian Kwacha (old)", "ZK"),
    entry("BWP", "Botswana Pula", "P"),
    entry("NAD", "Namibian Dollar", "N$"),
    entry("SZL", "Swazi Lilangeni", "E"),
    entry("LSL", "Lesotho Loti", "L"),
    entry("MZN", "Mozambican Metical", "MT"),
    entry("AOA", "Angolan Kwanza", "Kz"),
    entry("CVE", "Cape Verdean Escudo", "$"),
    entry("GMD", "Gambian Dalasi", "D"),
    entry("SLL", "Sierra Leonean Leone", "Le"),
    entry("LRD", "Liberian Dollar", "L$"),
    entry("ERN", "Eritrean Nakfa", "Nfk"),
    entry("SOS", "Somali Shilling", "Sh.So."),
    entry("MRO", "Mauritanian Ouguiya", "UM"),
    entry("STD", "São Tomé and Príncipe Dobra", "Db"),

    // Asia
    entry("KRW", "South Korean Won", "₩"),
    entry("TWD", "Taiwan Dollar", "NT$"),
    entry("THB", "Thai Baht", "฿"),
    entry("MYR", "Malaysian Ringgit", "RM"),
    entry("IDR", "Indonesian Rupiah", "Rp"),
    entry("PHP", "Philippine Peso", "₱"),
    entry("VND", "Vietnamese Dong", "₫"),
    entry("PKR", "Pakistani Rupee", "₨"),
    entry("BDT", "Bangladeshi Taka", "৳"),
    entry("LKR", "Sri Lankan Rupee", "Rs"),
    entry("NPR", "Nepalese Rupee", "₨"),
    entry("MMK", "Myanmar Kyat", "K"),
    entry("KHR", "Cambodian Riel", "៛"),
    entry("LAK", "Lao Kip", "₭"),
    entry("BND", "Brunei Dollar", "B$"),
    entry("MOP", "Macanese Pataca", "MOP$"),
    entry("MNT", "Mongolian Tugrik", "₮"),
    entry("KZT", "Kazakhstani Tenge", "₸"),
    entry("UZS", "Uzbekistani Som", "soʻm"),
    entry("TJS", "Tajikistani Somoni", "ЅМ"),
    entry("KGS", "Kyrgyzstani Som", "с"),
    entry("TMT", "Turkmenistani Manat", "m"),
    entry("AFN", "Afghan Afghani", "؋"),
    entry("BTN", "Bhutanese Ngultrum", "Nu."),
    entry("MVR", "Maldivian Rufiyaa", "Rf"),
    entry("KPW", "North Korean Won", "₩"),

    // Americas
    entry("MXN", "Mexican Peso", "MX$"),
    entry("BRL", "Brazilian Real", "R$"),
    entry("ARS", "Argentine Peso", "AR$"),
    entry("CLP", "Chilean Peso", "CL$"),
    entry("COP", "Colombian Peso", "CO$"),
    entry("PEN", "Peruvian Sol", "S/"),
    entry("VEF", "Venezuelan Bolívar", "Bs"),
    entry("UYU", "Uruguayan Peso", "$U"),
    entry("PYG", "Paraguayan Guarani", "₲"),
    entry("BOB", "Bolivian Boliviano", "Bs."),
    entry("CRC", "Costa Rican Colón", "₡"),
    entry("GTQ", "Guatemalan Quetzal", "Q"),
    entry("HNL", "Honduran Lempira", "L"),
    entry("NIO", "Nicaraguan Córdoba", "C$"),
    entry("PAB", "Panamanian Balboa", "B/."),
    entry("DOP", "Dominican Peso", "RD$"),
    entry("CUP", "Cuban Peso", "₱"),
    entry("CUC", "Cuban Convertible Peso", "CUC$"),
    entry("HTG", "Haitian Gourde", "G"),
    entry("JMD", "Jamaican Dollar", "J$"),
    entry("TTD", "Trinidad and Tobago Dollar", "TT$"),
    entry("BBD", "Barbadian Dollar", "Bds$"),
    entry("BSD", "Bahamian Dollar", "B$"),
    entry("BMD", "Bermudian Dollar", "BD$"),
    entry("KYD", "Cayman Islands Dollar", "CI$"),
    entry("XCD", "East Caribbean Dollar", "EC$"),
    entry("SVC", "Salvadoran Colón", "₡"),
    entry("AWG", "Aruban Florin", "Afl."),
    entry("ANG", "Netherlands Antillean Guilder", "NAƒ"),
    entry("SRD", "Surinamese Dollar", "Sr$"),
    entry("GYD", "Guyanese Dollar", "G$"),
    entry("CLF", "Chilean Unit of Account (UF)", "UF"),

    // Pacific
    entry("FJD", "Fijian Dollar", "FJ$"),
    entry("PGK", "Papua New Guinean Kina", "K"),
    entry("SBD", "Solomon Islands Dollar", "SI$"),
    entry("VUV", "Vanuatu Vatu", "VT"),
    entry("WST", "Samoan Tala", "WS$"),
    entry("TOP", "Tongan Paʻanga", "T$"),
    entry("XPF", "CFP Franc", "₣"),

    // Turkey
    entry("TRY", "Turkish Lira", "₺"),

    // Crypto
    entry("BTC", "Bitcoin", "₿"),
];

pub fn fallback_price(kind: MetalKind) -> f64 {
    match kind {
        MetalKind::Gold => FALLBACK_GOLD_PRICE,
        MetalKind::Silver => FALLBACK_SILVER_PRICE,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub currency_count: usize,
    /// Catalog entries that received a live rate instead of the default.
    pub live_rates: usize,
    pub gold_price: f64,
    pub silver_price: f64,
    pub success: bool,
}

impl SyncService {
    /// Writes the full currency catalog and both metals, using live values where
    /// the providers answer and fallbacks where they don't.
    ///
    /// Unlike [`SyncService::run_cycle`] this creates records, so it is the way
    /// to bootstrap an empty store.
    pub async fn seed(&self) -> Result<SeedReport> {
        let _guard = self.run_lock.lock().await;
        let now = self.clock.now();
        info!(currencies = CURRENCY_CATALOG.len(), "Seeding rate store");

        let (gold, silver, table) = tokio::join!(
            self.metals.fetch_ask(MetalKind::Gold),
            self.metals.fetch_ask(MetalKind::Silver),
            self.currencies.fetch_rates(),
        );

        let mut success = true;
        let rates = table.unwrap_or_else(|e| {
            warn!(error = %e, "Rate table unavailable, seeding default rates");
            success = false;
            BTreeMap::new()
        });

        let repository = self.repository();
        let mut live_rates = 0;
        for currency in CURRENCY_CATALOG {
            let rate = match rates.get(currency.code) {
                Some(rate) if rate.is_finite() && *rate > 0.0 => {
                    live_rates += 1;
                    *rate
                }
                _ => Currency::DEFAULT_RATE,
            };
            repository
                .upsert_currency(currency.code, currency.name, currency.symbol, rate)
                .await
                .with_context(|| format!("Failed to seed currency {}", currency.code))?;
        }

        let mut prices = [0.0; 2];
        for (slot, (kind, fetched)) in [(MetalKind::Gold, gold), (MetalKind::Silver, silver)]
            .into_iter()
            .enumerate()
        {
            let price = match fetched {
                Ok(ask) if ask.is_finite() && ask > 0.0 => ask,
                Ok(ask) => {
                    warn!(metal = %kind, ask, "Unusable ask, seeding fallback price");
                    success = false;
                    fallback_price(kind)
                }
                Err(e) => {
                    warn!(metal = %kind, error = %e, "Quote unavailable, seeding fallback price");
                    success = false;
                    fallback_price(kind)
                }
            };
            repository
                .upsert_metal(kind.name(), price, now)
                .await
                .with_context(|| format!("Failed to seed metal {kind}"))?;
            prices[slot] = price;
        }

        repository
            .append_log(&FetchLogEntry {
                fetched_at: now,
                metals_source: self.metals.source_name().to_string(),
                currency_source: self.currencies.source_name().to_string(),
                success,
            })
            .await?;
        repository.persist()?;

        let report = SeedReport {
            currency_count: CURRENCY_CATALOG.len(),
            live_rates,
            gold_price: prices[0],
            silver_price: prices[1],
            success,
        };
        info!(?report, "Seed finished");
        Ok(report)
    }
}
