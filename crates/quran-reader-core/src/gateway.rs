//! Remote content API access.
//!
//! One request is issued per edition (recitation, translation and the optional
//! commentary / transliteration editions) and the ayah lists are zipped by
//! position into `Verse` records.

use crate::config::AppConfig;
use crate::error::FetchError;
use crate::model::{GROUPING_COUNT, SECTION_COUNT, SectionDetail, SectionSummary, Verse};
use crate::preferences::Preferences;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// The editions requested for a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditionSet {
    pub recitation: String,
    pub translation: String,
    pub commentary: Option<String>,
    pub transliteration: Option<String>,
}

impl EditionSet {
    /// Editions implied by the current preferences.
    pub fn resolve(config: &AppConfig, prefs: &Preferences) -> Self {
        let settings = prefs.settings();
        let mapping = config.editions_for(&settings.language);
        Self {
            recitation: settings.reciter_id.clone(),
            translation: mapping
                .map(|m| m.translation.clone())
                .unwrap_or_else(|| "en.sahih".to_string()),
            commentary: mapping.and_then(|m| m.commentary.clone()),
            transliteration: prefs
                .reading_mode()
                .shows_transliteration()
                .then(|| config.transliteration_edition.clone()),
        }
    }
}

/// Boundary to the remote content API.
pub trait ContentGateway: Send + Sync {
    fn fetch_section(
        &self,
        section: u32,
        editions: &EditionSet,
    ) -> Result<SectionDetail, FetchError>;
    fn fetch_grouping(
        &self,
        grouping: u32,
        editions: &EditionSet,
    ) -> Result<Vec<Verse>, FetchError>;
    fn fetch_section_list(&self) -> Result<Vec<SectionSummary>, FetchError>;
}

pub struct AlQuranCloudGateway {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl AlQuranCloudGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Transport {
                url: base_url.to_string(),
                source,
            })?;
        info!(base_url, timeout_secs = timeout.as_secs(), "Content gateway ready");
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;
        parse_envelope(&body)
    }

    /// Fetch one listing in every requested edition concurrently.
    fn fetch_editions<T>(
        &self,
        kind: &str,
        number: u32,
        editions: &EditionSet,
    ) -> Result<EditionPayloads<T>, FetchError>
    where
        T: DeserializeOwned + Send,
    {
        thread::scope(|scope| {
            let recitation = scope.spawn(|| {
                self.get_json::<T>(&format!("{kind}/{number}/{}", editions.recitation))
            });
            let translation = scope.spawn(|| {
                self.get_json::<T>(&format!("{kind}/{number}/{}", editions.translation))
            });
            let commentary = editions.commentary.as_ref().map(|edition| {
                scope.spawn(move || self.get_json::<T>(&format!("{kind}/{number}/{edition}")))
            });
            let transliteration = editions.transliteration.as_ref().map(|edition| {
                scope.spawn(move || self.get_json::<T>(&format!("{kind}/{number}/{edition}")))
            });

            Ok(EditionPayloads {
                recitation: join(recitation)?,
                translation: join(translation)?,
                commentary: commentary.map(join).transpose()?,
                transliteration: transliteration.map(join).transpose()?,
            })
        })
    }
}

impl ContentGateway for AlQuranCloudGateway {
    fn fetch_section(
        &self,
        section: u32,
        editions: &EditionSet,
    ) -> Result<SectionDetail, FetchError> {
        check_range("section", section, SECTION_COUNT)?;
        let payloads = self.fetch_editions::<ApiSection>("surah", section, editions)?;
        build_section(payloads)
    }

    fn fetch_grouping(
        &self,
        grouping: u32,
        editions: &EditionSet,
    ) -> Result<Vec<Verse>, FetchError> {
        check_range("grouping", grouping, GROUPING_COUNT)?;
        let payloads = self.fetch_editions::<ApiGrouping>("juz", grouping, editions)?;
        build_grouping(payloads)
    }

    fn fetch_section_list(&self) -> Result<Vec<SectionSummary>, FetchError> {
        let list: Vec<ApiSectionSummary> = self.get_json("surah")?;
        Ok(list.into_iter().map(SectionSummary::from).collect())
    }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, Result<T, FetchError>>) -> Result<T, FetchError> {
    handle
        .join()
        .unwrap_or_else(|_| Err(FetchError::Malformed("edition fetch panicked".to_string())))
}

fn check_range(kind: &'static str, number: u32, max: u32) -> Result<(), FetchError> {
    if (1..=max).contains(&number) {
        Ok(())
    } else {
        Err(FetchError::OutOfRange { kind, number })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: u16,
    data: T,
}

pub(crate) fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|err| FetchError::Malformed(format!("invalid JSON payload: {err}")))?;
    if envelope.code != 200 {
        return Err(FetchError::Malformed(format!(
            "API reported code {}",
            envelope.code
        )));
    }
    Ok(envelope.data)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAyah {
    number: u32,
    text: String,
    number_in_surah: u32,
    #[serde(default)]
    audio: Option<String>,
    #[serde(default)]
    surah: Option<ApiSectionRef>,
}

#[derive(Debug, Deserialize)]
struct ApiSectionRef {
    number: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiSection {
    number: u32,
    name: String,
    english_name: String,
    english_name_translation: String,
    revelation_type: String,
    ayahs: Vec<ApiAyah>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiGrouping {
    ayahs: Vec<ApiAyah>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSectionSummary {
    number: u32,
    name: String,
    english_name: String,
    english_name_translation: String,
    number_of_ayahs: u32,
    revelation_type: String,
}

impl From<ApiSectionSummary> for SectionSummary {
    fn from(api: ApiSectionSummary) -> Self {
        SectionSummary {
            number: api.number,
            name: api.english_name,
            native_name: api.name,
            name_translation: api.english_name_translation,
            verse_count: api.number_of_ayahs,
            revelation_type: api.revelation_type,
        }
    }
}

pub(crate) struct EditionPayloads<T> {
    recitation: T,
    translation: T,
    commentary: Option<T>,
    transliteration: Option<T>,
}

impl<T> EditionPayloads<T> {
    fn map<U>(self, mut f: impl FnMut(T) -> U) -> EditionPayloads<U> {
        EditionPayloads {
            recitation: f(self.recitation),
            translation: f(self.translation),
            commentary: self.commentary.map(&mut f),
            transliteration: self.transliteration.map(&mut f),
        }
    }
}

pub(crate) fn build_section(
    payloads: EditionPayloads<ApiSection>,
) -> Result<SectionDetail, FetchError> {
    let number = payloads.recitation.number;
    let name = payloads.recitation.english_name.clone();
    let native_name = payloads.recitation.name.clone();
    let name_translation = payloads.recitation.english_name_translation.clone();
    let revelation_type = payloads.recitation.revelation_type.clone();
    let verses = merge_ayahs(payloads.map(|section| section.ayahs), Some(number))?;
    Ok(SectionDetail {
        number,
        name,
        native_name,
        name_translation,
        revelation_type,
        verses,
    })
}

pub(crate) fn build_grouping(
    payloads: EditionPayloads<ApiGrouping>,
) -> Result<Vec<Verse>, FetchError> {
    merge_ayahs(payloads.map(|grouping| grouping.ayahs), None)
}

/// Zip edition ayah lists by position. `section` overrides the per-ayah
/// section reference (single-section listings do not carry one).
fn merge_ayahs(
    payloads: EditionPayloads<Vec<ApiAyah>>,
    section: Option<u32>,
) -> Result<Vec<Verse>, FetchError> {
    let expected = payloads.recitation.len();
    let check_len = |label: &str, len: usize| {
        if len == expected {
            Ok(())
        } else {
            Err(FetchError::Malformed(format!(
                "{label} edition has {len} ayahs, recitation has {expected}"
            )))
        }
    };
    check_len("translation", payloads.translation.len())?;
    if let Some(commentary) = &payloads.commentary {
        check_len("commentary", commentary.len())?;
    }
    if let Some(transliteration) = &payloads.transliteration {
        check_len("transliteration", transliteration.len())?;
    }

    let mut translation = payloads.translation.into_iter();
    let mut commentary = payloads.commentary.map(Vec::into_iter);
    let mut transliteration = payloads.transliteration.map(Vec::into_iter);

    payloads
        .recitation
        .into_iter()
        .map(|ayah| {
            let owning_section = section
                .or_else(|| ayah.surah.as_ref().map(|s| s.number))
                .ok_or_else(|| {
                    FetchError::Malformed(format!("ayah {} has no owning section", ayah.number))
                })?;
            let audio_url = ayah.audio.ok_or_else(|| {
                FetchError::Malformed(format!("ayah {} has no audio reference", ayah.number))
            })?;
            Ok(Verse {
                number: ayah.number_in_surah,
                section: owning_section,
                global_number: ayah.number,
                text: ayah.text,
                translation: translation.next().map(|a| a.text).unwrap_or_default(),
                commentary: commentary.as_mut().and_then(Iterator::next).map(|a| a.text),
                transliteration: transliteration
                    .as_mut()
                    .and_then(Iterator::next)
                    .map(|a| a.text),
                audio_url,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::preferences::{Preferences, ReadingMode, Settings};

    fn ayah(number: u32, in_section: u32, text: &str, audio: bool, section: Option<u32>) -> String {
        let audio = if audio {
            format!(r#","audio":"https://cdn.test/{number}.mp3""#)
        } else {
            String::new()
        };
        let section = section
            .map(|n| format!(r#","surah":{{"number":{n},"name":"x","englishName":"x"}}"#))
            .unwrap_or_default();
        format!(
            r#"{{"number":{number},"text":"{text}","numberInSurah":{in_section}{audio}{section}}}"#
        )
    }

    fn section_body(ayahs: &[String]) -> String {
        format!(
            r#"{{"code":200,"status":"OK","data":{{"number":1,"name":"الفاتحة","englishName":"Al-Faatiha","englishNameTranslation":"The Opening","revelationType":"Meccan","numberOfAyahs":{},"ayahs":[{}]}}}}"#,
            ayahs.len(),
            ayahs.join(",")
        )
    }

    #[test]
    fn section_editions_zip_into_verses() {
        let recitation: ApiSection = parse_envelope(&section_body(&[
            ayah(1, 1, "bismillah", true, None),
            ayah(2, 2, "alhamdu", true, None),
        ]))
        .expect("recitation");
        let translation: ApiSection = parse_envelope(&section_body(&[
            ayah(1, 1, "In the name", false, None),
            ayah(2, 2, "Praise be", false, None),
        ]))
        .expect("translation");
        let commentary: ApiSection = parse_envelope(&section_body(&[
            ayah(1, 1, "c1", false, None),
            ayah(2, 2, "c2", false, None),
        ]))
        .expect("commentary");

        let detail = build_section(EditionPayloads {
            recitation,
            translation,
            commentary: Some(commentary),
            transliteration: None,
        })
        .expect("merged");

        assert_eq!(detail.name, "Al-Faatiha");
        assert_eq!(detail.native_name, "الفاتحة");
        assert_eq!(detail.info().verse_count, 2);
        assert_eq!(detail.verses[1].translation, "Praise be");
        assert_eq!(detail.verses[1].commentary.as_deref(), Some("c2"));
        assert_eq!(detail.verses[1].transliteration, None);
        assert!(detail.verses.iter().all(|v| v.section == 1));
        assert_eq!(detail.verses[0].audio_url, "https://cdn.test/1.mp3");
    }

    #[test]
    fn grouping_verses_carry_their_own_section() {
        let body = |audio: bool| {
            format!(
                r#"{{"code":200,"data":{{"number":30,"ayahs":[{},{}]}}}}"#,
                ayah(5673, 40, "last of 77", audio, Some(77)),
                ayah(5674, 1, "first of 78", audio, Some(78)),
            )
        };
        let recitation: ApiGrouping = parse_envelope(&body(true)).expect("recitation");
        let translation: ApiGrouping = parse_envelope(&body(false)).expect("translation");

        let verses = build_grouping(EditionPayloads {
            recitation,
            translation,
            commentary: None,
            transliteration: None,
        })
        .expect("merged");

        assert_eq!(verses.len(), 2);
        assert_eq!((verses[0].section, verses[0].number), (77, 40));
        assert_eq!((verses[1].section, verses[1].number), (78, 1));
        assert_eq!(verses[1].global_number, 5674);
    }

    #[test]
    fn mismatched_edition_lengths_are_malformed() {
        let recitation: ApiSection =
            parse_envelope(&section_body(&[
                ayah(1, 1, "a", true, None),
                ayah(2, 2, "b", true, None),
            ]))
                .expect("recitation");
        let translation: ApiSection =
            parse_envelope(&section_body(&[ayah(1, 1, "a", false, None)])).expect("translation");

        let err = build_section(EditionPayloads {
            recitation,
            translation,
            commentary: None,
            transliteration: None,
        })
        .unwrap_err();

        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn missing_audio_is_malformed() {
        let recitation: ApiSection =
            parse_envelope(&section_body(&[ayah(1, 1, "a", false, None)])).expect("recitation");
        let translation: ApiSection =
            parse_envelope(&section_body(&[ayah(1, 1, "a", false, None)])).expect("translation");
        let err = build_section(EditionPayloads {
            recitation,
            translation,
            commentary: None,
            transliteration: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("no audio reference"));
    }

    #[test]
    fn error_envelope_and_garbage_are_rejected() {
        assert!(parse_envelope::<ApiGrouping>(r#"{"code":404,"data":{"ayahs":[]}}"#).is_err());
        assert!(parse_envelope::<ApiGrouping>("<html>").is_err());
    }

    #[test]
    fn section_list_maps_names() {
        let list: Vec<ApiSectionSummary> = parse_envelope(
            r#"{"code":200,"data":[{"number":10,"name":"يونس","englishName":"Yunus","englishNameTranslation":"Jonah","numberOfAyahs":109,"revelationType":"Meccan"}]}"#,
        )
        .expect("list");
        let summary = SectionSummary::from(list.into_iter().next().expect("one entry"));
        assert_eq!(summary.name, "Yunus");
        assert_eq!(summary.native_name, "يونس");
        assert_eq!(summary.verse_count, 109);
    }

    #[test]
    fn editions_follow_language_and_reading_mode() {
        let config = AppConfig::default();
        let mut settings = Settings::from_config(&config);
        settings.language = "en".to_string();
        let prefs = Preferences::new(settings, ReadingMode::WithTranslationAndTransliteration);

        let editions = EditionSet::resolve(&config, &prefs);

        assert_eq!(editions.recitation, "ar.alafasy");
        assert_eq!(editions.translation, "en.sahih");
        assert_eq!(editions.commentary, None);
        assert_eq!(editions.transliteration.as_deref(), Some("en.transliteration"));
    }

    #[test]
    fn out_of_range_numbers_fail_before_any_request() {
        let gateway = AlQuranCloudGateway::new("http://127.0.0.1:9", Duration::from_secs(1))
            .expect("client builds");
        let editions = EditionSet::resolve(
            &AppConfig::default(),
            &Preferences::new(Settings::from_config(&AppConfig::default()), ReadingMode::default()),
        );
        assert!(matches!(
            gateway.fetch_section(115, &editions),
            Err(FetchError::OutOfRange { kind: "section", number: 115 })
        ));
        assert!(matches!(
            gateway.fetch_grouping(0, &editions),
            Err(FetchError::OutOfRange { kind: "grouping", number: 0 })
        ));
    }
}
