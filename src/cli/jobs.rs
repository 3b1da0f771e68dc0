use crate::cli::commands::JobsArgs;
use crate::config::MeisterConfig;
use crate::creators::{enqueue_all, JobCreator};
use crate::errors::MeisterError;
use crate::models::JobKind;

pub async fn handle_jobs(args: JobsArgs, config: &MeisterConfig) -> Result<(), MeisterError> {
    let kind: JobKind = args.kind.parse()?;
    let db = super::open_database(config)?;

    if args.list {
        for job in db.list_jobs(Some(kind))? {
            println!(
                "{}\t{}\t{}\t{} cpus / {} mem\t{}",
                job.descriptor.id,
                job.descriptor.kind,
                job.descriptor.cbn_id,
                job.descriptor.limits.cpus,
                job.descriptor.limits.memory,
                job.status.as_str(),
            );
        }
        return Ok(());
    }

    if args.dry_run {
        let creator = JobCreator::new(kind);
        let mut count = 0;
        for job in creator.jobs(db.all_cbns()?, &db) {
            let job = job?;
            println!("would queue {} job for {}", job.kind, job.cbn_id);
            count += 1;
        }
        println!("{} {} jobs pending", count, kind);
        return Ok(());
    }

    let created = enqueue_all(&db, kind)?;
    println!("Queued {} {} jobs", created.len(), kind);
    Ok(())
}
