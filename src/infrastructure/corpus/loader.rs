use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::models::{ExampleMetadata, ReferenceExample, RetrievalConfig};

/// Texts longer than this many characters are split before indexing.
const CHUNK_THRESHOLD: usize = 300;
const CHUNK_SIZE: usize = 250;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    List(Vec<RawExample>),
    Wrapped { examples: Vec<RawExample> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawExample {
    Text(String),
    Entry(RawEntry),
}

#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    #[serde(default, alias = "text")]
    content: String,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    school_level: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    activity_type: Option<String>,
    #[serde(default)]
    grade: Option<String>,
}

impl From<RawExample> for RawEntry {
    fn from(raw: RawExample) -> Self {
        match raw {
            RawExample::Text(content) => Self {
                content,
                ..Default::default()
            },
            RawExample::Entry(entry) => entry,
        }
    }
}

impl RawEntry {
    fn builtin(subject: &str, grade: &str, activity: &str, keywords: &[&str], content: &str) -> Self {
        Self {
            content: content.to_string(),
            subject: Some(subject.to_string()),
            school_level: Some("고등학교".to_string()),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            activity_type: Some(activity.to_string()),
            grade: Some(grade.to_string()),
        }
    }

    fn metadata(&self, chunk_index: usize) -> ExampleMetadata {
        ExampleMetadata {
            subject: self.subject.clone(),
            school_level: self.school_level.clone(),
            keywords: self.keywords.clone(),
            activity_type: self.activity_type.clone(),
            grade: self.grade.clone(),
            chunk_index,
        }
    }
}

/// Loads the reference corpus from a JSON file, or the built-in set.
#[derive(Debug, Clone, Default)]
pub struct ExampleLoader {
    path: Option<PathBuf>,
}

impl ExampleLoader {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(config.examples_path.as_ref().map(PathBuf::from))
    }

    /// Load and chunk the corpus. Never fails: a bad file falls back to the built-in set.
    pub fn load_all(&self) -> Vec<ReferenceExample> {
        let mut entries = Vec::new();

        if let Some(path) = &self.path {
            match Self::load_file(path) {
                Ok(loaded) => {
                    info!(path = %path.display(), count = loaded.len(), "examples loaded from file");
                    entries = loaded;
                }
                Err(e) => warn!(path = %path.display(), error = %format!("{e:#}"), "example file ignored"),
            }
        }

        if entries.is_empty() {
            entries = default_examples();
            info!(count = entries.len(), "using built-in examples");
        }

        process(entries)
    }

    fn load_file(path: &Path) -> Result<Vec<RawEntry>> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: CorpusFile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        let examples = match file {
            CorpusFile::List(examples) | CorpusFile::Wrapped { examples } => examples,
        };
        Ok(examples.into_iter().map(RawEntry::from).collect())
    }
}

fn process(entries: Vec<RawEntry>) -> Vec<ReferenceExample> {
    let mut processed = Vec::with_capacity(entries.len());
    for entry in entries {
        let content = entry.content.trim();
        if content.is_empty() {
            continue;
        }
        if content.chars().count() > CHUNK_THRESHOLD {
            for (index, chunk) in chunk_text(content, CHUNK_SIZE).into_iter().enumerate() {
                processed.push(ReferenceExample::new(chunk, entry.metadata(index)));
            }
        } else {
            processed.push(ReferenceExample::new(content, entry.metadata(0)));
        }
    }
    processed
}

/// Split on `.` and regroup sentences into chunks below `chunk_size` characters.
///
/// Each chunk ends with a period. A single sentence longer than the limit
/// becomes its own chunk.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in text.split('.').map(str::trim).filter(|s| !s.is_empty()) {
        if current.chars().count() + sentence.chars().count() + 1 < chunk_size {
            if !current.is_empty() {
                current.push_str(". ");
            }
            current.push_str(sentence);
        } else {
            if !current.is_empty() {
                chunks.push(format!("{current}."));
            }
            current = sentence.to_string();
        }
    }

    if !current.is_empty() {
        chunks.push(format!("{current}."));
    }
    chunks
}

fn default_examples() -> Vec<RawEntry> {
    vec![
        RawEntry::builtin(
            "수학",
            "고2",
            "탐구",
            &["쌍곡선", "탐구", "실험", "지오지브라", "벡터"],
            "쌍곡선에 대해 배우면서 교과서에 쌍곡면의 구조가 풍압에 잘 견뎌 냉각로 등에 사용된다는 것을 보고 '왜 그럴까?'에 대해 관심을 가지게 되어 관련된 탐구를 진행함. 실험조건에 맞는 쌍곡면을 만드는 쌍곡선의 식을 세우고, 지오지브라, 스케치업 등을 이용하여 정확한 실험물을 수학적으로 제작함. 또한 실험결과를 해석할 때도 벡터의 개념을 도입하여 원기둥이 사각기둥보다 풍압에 잘 견딜 수 있었던 이유를 설명함.",
        ),
        RawEntry::builtin(
            "수학",
            "고2",
            "탐구",
            &["피보나치", "수열", "프로그래밍", "융합", "보고서"],
            "수학탐구시간에 자신이 가장 좋아하는 수열인 피보나치 수열에 대해 조사하여 피보나치 수열의 개념과 일반항을 구하는 방법을 탐구하고 정보시간에 배우는 플레이봇을 통해 피보나치 수열을 구하는 프로그램을 직접 만들어 수학을 탐구하고 보고서를 작성함.",
        ),
        RawEntry::builtin(
            "수학",
            "고2",
            "대회",
            &["큐브", "경우의수", "군론", "수학체험전", "전시"],
            "교내 수학체험전에서 큐브의 경우의 수에 대해 관심을 가져 222큐브와 333큐브에서 엣지 조각의 개수는 짝수개이며 코너조각의 돌아간 각도의 합은 360도가 되어야한다는 규칙을 알게 되었고 각 경우의 수를 직접 계산함. 또한, 큐브의 모든 섞인 상태를 집합으로 하고 돌리는 회전을 연산으로 구성하여 군(Group)이 됨을 확인하고 자료를 제작하여 전시하고 친구들에게 실생활의 여러 부분에서 수학을 발견할 수 있다는 사실을 알려줌.",
        ),
        RawEntry::builtin(
            "수학",
            "고3",
            "평가",
            &["논리적사고", "미적분", "극한", "개념이해"],
            "논리적인 사고력과 사회현상에 대한 이해, 끊임없이 노력하는 열정적인 학업태도가 돋보이는 학생으로 함수의 극한, 미적분 등 전 영역에 걸쳐 개념별로 본질을 파악하여 전체적인 맥을 연결할 수 있는 능력이 있음.",
        ),
        RawEntry::builtin(
            "수학",
            "고2",
            "탐구",
            &["무한등비급수", "경제", "승수효과", "융합"],
            "조세의 과다 징수에 대한 기사를 읽던 중 재정 정책의 효과가 무한등비급수로 나타나는 것을 보고 이를 수학 시간에 적용해보고자 함. 승수 효과를 주제로 선정하여 다양한 서적들을 통해 자료를 수집함. 이를 바탕으로 조세 감소와 이로 인해 발생하는 국민소득, 소비 증가분을 계산하고 더욱 나아가 통화정책의 투자 승수와 통화승수를 조사함.",
        ),
        RawEntry::builtin(
            "물리",
            "고2",
            "실험",
            &["운동량보존", "실험", "충돌", "데이터분석"],
            "수업 시간에 배운 운동량 보존 법칙을 실생활에 적용하여 자동차 충돌 실험을 설계함. 다양한 질량의 모형 자동차를 제작하고 충돌 전후의 속도를 측정하여 운동량이 보존됨을 실험적으로 증명함. 실험 데이터를 그래프로 나타내고 오차 원인을 분석하는 과정에서 과학적 탐구 능력을 보여줌.",
        ),
        RawEntry::builtin(
            "화학",
            "고2",
            "프로젝트",
            &["산화환원", "전지", "실험", "pH"],
            "산화환원 반응에 대해 학습한 후 과일 전지 만들기 프로젝트를 진행함. 레몬, 오렌지, 감자 등 다양한 과일과 채소를 이용하여 전지를 만들고 전압을 측정함. pH와 전압의 관계를 탐구하고 최적의 전해질 농도를 찾기 위한 실험을 설계하여 수행함.",
        ),
        RawEntry::builtin(
            "생물",
            "고3",
            "탐구",
            &["DNA", "PCR", "생명공학", "COVID-19"],
            "DNA 복제 과정에 대해 학습한 후 PCR(중합효소 연쇄 반응) 기술의 원리와 응용에 대해 심화 탐구함. COVID-19 진단에 사용되는 RT-PCR의 원리를 이해하고, 이를 바탕으로 감염병 진단 기술의 발전 방향에 대한 보고서를 작성함.",
        ),
    ]
}
