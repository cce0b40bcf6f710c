use crate::operation::Operation;
use crate::report::ReportLine;
use crate::types::Record;
use crate::update;

/// What to do with one enumerated record
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Not a stream entry, or not the client asked about
    Skip,
    /// Print the current state of the record
    Report(ReportLine),
    /// Store this updated record in replace mode
    Write(Record),
}

/// Matches enumerated records against the operation
#[derive(Debug, Default)]
pub struct Enumerator {
    found: bool,
}

impl Enumerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a record for the targeted client has been seen
    pub fn found(&self) -> bool {
        self.found
    }

    /// Decide what to do with `record`
    ///
    /// Records outside the stream categories are skipped. A pending mutation
    /// only ever touches the targeted client; without one, the target (or
    /// every client if there is no target) is reported.
    pub fn on_record(&mut self, operation: &Operation, record: &Record) -> Decision {
        let Some((category, client)) = record.identity() else {
            tracing::trace!("Skipping {}", record.key);
            return Decision::Skip;
        };

        let is_target = operation.targets(client);
        if is_target {
            self.found = true;
        }

        match operation.mutation {
            Some(mutation) if is_target => {
                tracing::info!("Updating {:?} entry for {}: {:?}", category, client, mutation);
                Decision::Write(update::apply(record, mutation, operation.device.as_deref()))
            }
            None if operation.target.is_none() || is_target => {
                Decision::Report(ReportLine::from_record(client, record, operation.show_device))
            }
            _ => Decision::Skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Mutation;
    use crate::types::{Category, Volume};

    fn record(client: &str) -> Record {
        Record::application(client).with_stereo_volume(Volume::NORM)
    }

    #[test]
    fn test_unrecognized_categories_are_skipped() {
        let mut enumerator = Enumerator::new();
        let operation = Operation::report("paplay");
        let foreign = Record::new("source-output-by-application-name:paplay");

        assert_eq!(enumerator.on_record(&operation, &foreign), Decision::Skip);
        assert!(!enumerator.found());
    }

    #[test]
    fn test_report_all_reports_every_stream_entry() {
        let mut enumerator = Enumerator::new();
        let operation = Operation::report_all();
        let media = Record::new(Category::MediaRole.key("event"));

        assert!(matches!(
            enumerator.on_record(&operation, &record("paplay")),
            Decision::Report(line) if line.client == "paplay"
        ));
        assert!(matches!(
            enumerator.on_record(&operation, &media),
            Decision::Report(line) if line.client == "event"
        ));
        assert!(!enumerator.found());
    }

    #[test]
    fn test_report_target_only() {
        let mut enumerator = Enumerator::new();
        let operation = Operation::report("mpv");

        assert_eq!(enumerator.on_record(&operation, &record("paplay")), Decision::Skip);
        assert!(!enumerator.found());
        assert!(matches!(
            enumerator.on_record(&operation, &record("mpv")),
            Decision::Report(_)
        ));
        assert!(enumerator.found());
    }

    #[test]
    fn test_mutation_writes_target_only() {
        let mut enumerator = Enumerator::new();
        let operation = Operation::mutate("mpv", Mutation::Mute).with_device("hdmi");

        assert_eq!(enumerator.on_record(&operation, &record("paplay")), Decision::Skip);
        match enumerator.on_record(&operation, &record("mpv")) {
            Decision::Write(new) => {
                assert!(new.muted);
                assert_eq!(new.device.as_deref(), Some("hdmi"));
                assert_eq!(new.key, record("mpv").key);
            }
            other => panic!("expected a write, got {:?}", other),
        }
        assert!(enumerator.found());
    }

    #[test]
    fn test_mutation_without_target_never_writes() {
        let mut enumerator = Enumerator::new();
        let operation = Operation {
            mutation: Some(Mutation::ToggleMute),
            ..Operation::default()
        };
        assert_eq!(enumerator.on_record(&operation, &record("paplay")), Decision::Skip);
    }
}
