use super::model::{DEVICE_TYPE_KEY, InstanceRecord, NUM_OF_PORTS_KEY, PROPERTY_KEY};
use crate::domain::LpeError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const INSTANCE_SECTION_MARKER: &str = "Instance Section";
pub const OA_DEVICE_MARKERS: [&str; 2] = ["llx", "djnw"];

#[derive(Debug, thiserror::Error)]
pub enum NetlistError {
    #[error("failed to read netlist '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("instance section lines are not collected from '{}'", path.display())]
    EmptyInstanceSection { path: PathBuf },
    #[error("malformed instance line {line} in '{}': {fault}", path.display())]
    MalformedLine {
        path: PathBuf,
        line: usize,
        fault: LineFault,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineFault {
    #[error("no key=value properties follow the device tokens")]
    MissingProperties,
    #[error("line starts with property '{0}' instead of a device name")]
    LeadingProperty(String),
    #[error("token '{0}' after the first property is not a key=value pair")]
    BareToken(String),
}

impl From<NetlistError> for LpeError {
    fn from(error: NetlistError) -> Self {
        let message = error.to_string();
        match error {
            NetlistError::Read { .. } => LpeError::io_system("IO.NETLIST_READ", message),
            NetlistError::EmptyInstanceSection { .. } => {
                LpeError::input_validation("INPUT.INSTANCE_SECTION", message)
            }
            NetlistError::MalformedLine { .. } => {
                LpeError::input_validation("INPUT.INSTANCE_LINE", message)
            }
        }
    }
}

/// Builds a record from one whitespace-tokenized device line.
///
/// Lines with two or fewer tokens do not describe a device and yield `None`.
/// Tokens before the first `key=value` token are the device name, its ports,
/// and the model name (the token right before the first property).
pub fn parse_instance_line(line: &str) -> Result<Option<InstanceRecord>, LineFault> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() <= 2 {
        return Ok(None);
    }

    let first_property = tokens
        .iter()
        .position(|token| token.contains('='))
        .ok_or(LineFault::MissingProperties)?;
    if first_property == 0 {
        return Err(LineFault::LeadingProperty(tokens[0].to_string()));
    }

    let mut record = InstanceRecord::default();
    record.insert(PROPERTY_KEY, tokens[0]);
    record.insert(DEVICE_TYPE_KEY, tokens[first_property - 1]);
    record.insert(
        NUM_OF_PORTS_KEY,
        (first_property as i64 - 2).to_string(),
    );

    for token in &tokens[first_property..] {
        let (name, value) = token
            .split_once('=')
            .ok_or_else(|| LineFault::BareToken(token.to_string()))?;
        record.insert(name, value);
    }

    Ok(Some(record))
}

/// Materializes the records of candidate lines, numbered from 1.
///
/// An empty candidate set, or one where no line qualifies, means the section
/// was announced but carries no devices.
pub fn records_from_lines<'a, I>(lines: I, source: &Path) -> Result<Vec<InstanceRecord>, NetlistError>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut records = Vec::new();
    for (line_number, line) in lines {
        let record = parse_instance_line(line).map_err(|fault| NetlistError::MalformedLine {
            path: source.to_path_buf(),
            line: line_number,
            fault,
        })?;
        if let Some(record) = record {
            records.push(record);
        }
    }

    if records.is_empty() {
        return Err(NetlistError::EmptyInstanceSection {
            path: source.to_path_buf(),
        });
    }
    Ok(records)
}

/// Lines after the first `Instance Section` marker, or `None` when the
/// marker never appears.
pub fn instance_section_lines(text: &str) -> Option<impl Iterator<Item = (usize, &str)>> {
    let marker_index = text
        .lines()
        .position(|line| line.contains(INSTANCE_SECTION_MARKER))?;

    Some(
        text.lines()
            .enumerate()
            .skip(marker_index + 1)
            .filter(|(_, line)| !line.contains(INSTANCE_SECTION_MARKER))
            .map(|(index, line)| (index + 1, line)),
    )
}

pub fn parse_spf_instances(text: &str, source: &Path) -> Result<Vec<InstanceRecord>, NetlistError> {
    let Some(lines) = instance_section_lines(text) else {
        debug!(path = %source.display(), "no instance section marker found");
        return Ok(Vec::new());
    };
    let records = records_from_lines(lines, source)?;
    info!(path = %source.display(), count = records.len(), "device data found in SPF instance section");
    Ok(records)
}

pub fn read_spf_instances(path: impl AsRef<Path>) -> Result<Vec<InstanceRecord>, NetlistError> {
    let path = path.as_ref();
    let text = read_netlist(path)?;
    parse_spf_instances(&text, path)
}

/// Device lines of an OA-derived netlist are recognized by their placement
/// or deep n-well tokens rather than a section marker.
pub fn parse_oa_devices(text: &str, source: &Path) -> Result<Vec<InstanceRecord>, NetlistError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| OA_DEVICE_MARKERS.iter().any(|marker| line.contains(marker)))
        .map(|(index, line)| (index + 1, line))
        .peekable();

    if lines.peek().is_none() {
        debug!(path = %source.display(), "no OA device lines found");
        return Ok(Vec::new());
    }
    let records = records_from_lines(lines, source)?;
    info!(path = %source.display(), count = records.len(), "device data found in OA netlist");
    Ok(records)
}

pub fn read_oa_devices(path: impl AsRef<Path>) -> Result<Vec<InstanceRecord>, NetlistError> {
    let path = path.as_ref();
    let text = read_netlist(path)?;
    parse_oa_devices(&text, path)
}

/// Joins backslash-continued lines of a spectre netlist.
pub fn normalize_line_continuations(text: &str) -> String {
    text.replace("\\\n", "")
}

fn read_netlist(path: &Path) -> Result<String, NetlistError> {
    fs::read_to_string(path).map_err(|source| NetlistError::Read {
        path: path.to_path_buf(),
        source,
    })
}
