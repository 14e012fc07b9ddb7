//! Prompt builders for the generate, validate and fix steps.

use crate::domain::models::TeacherInput;

pub const EXAMPLES_HEADER: &str = "## 우수 세특 예시 (참고용)\n";

/// Used in place of examples when retrieval came back empty.
pub const GUIDELINE_BLOCK: &str = "## 작성 가이드라인\n\
- 구체적인 활동과 탐구 과정 포함\n\
- 학생의 자발적 관심과 노력 강조\n\
- 성과와 결과물 명시\n";

pub const GENERAL_IMPROVEMENT: &str = "전반적인 품질 개선 필요";

const FIX_INSTRUCTIONS: &str = "수정 지침:\n\
1. 위 개선 사항을 하나도 빠짐없이 모두 반영하세요\n\
2. 학생 이름, 과목, 두 점수, 추가사항을 반드시 포함하세요\n\
3. 입력 정보나 예시에 없는 활동을 지어내지 마세요\n\
4. 예시의 문체만 참고하고 내용은 복사하지 마세요\n\
5. 수정된 세특 본문만 출력하세요";

/// Score as it appears in a prompt. A missing score is never shown as zero.
fn score_text(score: Option<u32>) -> String {
    score.map_or_else(|| "미입력".to_string(), |value| format!("{value}점"))
}

/// Numbered examples section, or the generic guideline when there are none.
pub fn format_examples_section(examples: &[String]) -> String {
    if examples.is_empty() {
        return GUIDELINE_BLOCK.to_string();
    }

    let mut section = EXAMPLES_HEADER.to_string();
    for (i, example) in examples.iter().enumerate() {
        section.push_str(&format!("\n### 예시 {}\n{}\n", i + 1, example));
    }
    section
}

pub fn build_generation_prompt(input: &TeacherInput, examples: &[String]) -> String {
    format!(
        "다음 학생의 세부능력 및 특기사항을 작성해주세요.\n\n\
학생 정보:\n\
- 이름: {name}\n\
- 과목: {subject}\n\
- 중간 수행평가: {midterm}\n\
- 기말 수행평가: {final_score}\n\
- 추가사항: {notes}\n\
- 성취기준: {standards}\n\n\
{examples}\n\
작성 지침:\n\
1. 과목명과 두 점수를 자연스럽게 포함하세요\n\
2. 추가사항과 예시에 근거한 활동만 서술하고 새로운 활동을 지어내지 마세요\n\
3. 교육적이고 긍정적인 어조의 개조식 문장(~함, ~임)으로 작성하세요\n\
4. 300-500자 내외의 본문만 출력하세요",
        name = input.display_name(),
        subject = input.subject,
        midterm = score_text(input.midterm_score),
        final_score = score_text(input.final_score),
        notes = input.notes_or_none(),
        standards = input.standards_or_empty(),
        examples = format_examples_section(examples),
    )
}

pub fn build_validation_prompt(input: &TeacherInput, content: &str) -> String {
    format!(
        "생성된 세부능력 특기사항을 두 가지 기준으로 검토해주세요.\n\n\
선생님 입력 정보:\n\
- 학생 이름: {name}\n\
- 과목명: {subject}\n\
- 중간 수행평가: {midterm}\n\
- 기말 수행평가: {final_score}\n\
- 추가사항: {notes}\n\
- 성취기준: {standards}\n\n\
생성된 세특:\n{content}\n\n\
검토 기준:\n\
1. 입력 반영: 과목명과 두 점수가 포함되어 있는지, 추가사항이 \"없음\"이 아니라면 반영되었는지, 입력에 없는 구체적 활동을 지어내지 않았는지\n\
2. 문장 품질: 문법, 맞춤법, 어휘, 교육 문서에 맞는 어조\n\n\
확실한 문제가 아니라면 문제가 없다고 판단하세요.\n\
다음 형식의 JSON만 응답하세요 (설명 없이):\n\
{{\"is_valid\": true 또는 false, \"issues\": [{{\"type\": \"누락 또는 표현 또는 활동\", \"description\": \"문제 설명\"}}], \"summary\": \"한 줄 요약\"}}",
        name = input.display_name(),
        subject = input.subject,
        midterm = score_text(input.midterm_score),
        final_score = score_text(input.final_score),
        notes = input.notes_or_none(),
        standards = input.standards_or_empty(),
        content = content,
    )
}

/// Group issues into an improvement brief.
///
/// Missing-information issues come first, then quality issues, then the rest.
pub fn format_improvements(issues: &[String]) -> String {
    if issues.is_empty() {
        return GENERAL_IMPROVEMENT.to_string();
    }

    let mut required = Vec::new();
    let mut quality = Vec::new();
    let mut other = Vec::new();
    for issue in issues {
        if issue.contains("누락") || issue.contains("점수") {
            required.push(issue);
        } else if issue.contains("활동") || issue.contains("표현") {
            quality.push(issue);
        } else {
            other.push(issue);
        }
    }

    let sections = [
        ("### 필수 정보 포함", required),
        ("### 품질 개선", quality),
        ("### 기타 수정사항", other),
    ];
    sections
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(title, items)| {
            let lines: Vec<String> = items.iter().map(|issue| format!("- {issue}")).collect();
            format!("{title}\n{}", lines.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_fix_prompt(
    input: &TeacherInput,
    current: &str,
    improvements: &str,
    examples: &[String],
) -> String {
    let examples_text = if examples.is_empty() {
        GUIDELINE_BLOCK.to_string()
    } else {
        examples
            .iter()
            .enumerate()
            .map(|(i, example)| format!("예시 {}:\n{}", i + 1, example))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!(
        "다음 세부능력 및 특기사항을 개선 사항에 맞게 다시 작성해주세요.\n\n\
학생 정보:\n\
- 이름: {name}\n\
- 과목: {subject}\n\
- 중간 수행평가: {midterm}\n\
- 기말 수행평가: {final_score}\n\
- 추가사항: {notes}\n\
- 성취기준: {standards}\n\n\
현재 세특:\n{current}\n\n\
## 개선 사항\n{improvements}\n\n\
## 참고 예시\n{examples_text}\n\n\
{FIX_INSTRUCTIONS}",
        name = input.display_name(),
        subject = input.subject,
        midterm = score_text(input.midterm_score),
        final_score = score_text(input.final_score),
        notes = input.notes_or_none(),
        standards = input.standards_or_empty(),
    )
}
