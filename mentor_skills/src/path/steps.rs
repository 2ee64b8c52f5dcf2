//! Static next-step table, keyed by (domain, current level)

use crate::domain::Domain;
use crate::level::Level;

/// Recommended actions for moving `domain` up from `level`
pub fn next_steps(domain: Domain, level: Level) -> &'static [&'static str] {
    use Domain::*;
    use Level::*;

    match (domain, level) {
        (CiCd, Unknown) => &[
            "Create a GitHub Actions workflow that runs tests on every push",
            "Read the workflow syntax reference for jobs, steps and triggers",
        ],
        (CiCd, Beginner) => &[
            "Add dependency caching and upload build artifacts from your pipeline",
            "Split the pipeline into build, test and deploy jobs",
        ],
        (CiCd, Developing) => &[
            "Set up a GitHub Actions workflow with caching, matrix builds, and environment protection",
            "Add concurrency groups so stale runs are cancelled",
        ],
        (CiCd, Solid) => &[
            "Build reusable workflows and composite actions shared across repositories",
            "Gate deployments on required checks and protected branches",
        ],

        (Containers, Unknown) => &[
            "Containerise a small application with a single-stage Dockerfile",
            "Run it locally and inspect image layers with docker history",
        ],
        (Containers, Beginner) => &[
            "Write a multi-stage Dockerfile and compose file for a real application",
            "Pin base image versions and add a .dockerignore",
        ],
        (Containers, Developing) => &[
            "Run containers as a non-root user with a minimal base image",
            "Add health checks and resource limits to your compose services",
        ],
        (Containers, Solid) => &[
            "Scan images for vulnerabilities in CI and sign what you publish",
            "Tune image size and build cache for faster pipeline builds",
        ],

        (InfrastructureAsCode, Unknown) => &[
            "Write a Terraform configuration that provisions a single resource",
            "Learn the init, plan and apply cycle and what the state file records",
        ],
        (InfrastructureAsCode, Beginner) => &[
            "Create a Terraform module with remote state, variables, and outputs",
            "Move state to a remote backend with state locking",
        ],
        (InfrastructureAsCode, Developing) => &[
            "Split environments with workspaces or separate state per stage",
            "Run terraform fmt, validate and plan in your CI pipeline",
        ],
        (InfrastructureAsCode, Solid) => &[
            "Publish versioned modules and pin provider versions",
            "Add policy checks to plans before apply",
        ],

        (CloudPlatform, Unknown) => &[
            "Create an AWS account sandbox and explore IAM users, roles and policies",
            "Launch and tear down an EC2 instance and an S3 bucket",
        ],
        (CloudPlatform, Beginner) => &[
            "Deploy a VPC with public/private subnets, NAT, and security groups",
            "Host a static site on S3 behind CloudFront",
        ],
        (CloudPlatform, Developing) => &[
            "Run a service on ECS or EKS with auto-scaling",
            "Move a database to RDS with automated backups",
        ],
        (CloudPlatform, Solid) => &[
            "Design a multi-account layout with shared networking",
            "Review cost and reliability trade-offs for your main workloads",
        ],

        (Security, Unknown) => &[
            "Move every hardcoded credential into a secrets manager",
            "Learn how IAM permissions are evaluated",
        ],
        (Security, Beginner) => &[
            "Implement IAM least-privilege policies and enable encryption at rest",
            "Restrict workflow permissions to the minimum each job needs",
        ],
        (Security, Developing) => &[
            "Replace long-lived cloud keys in CI with OIDC federation",
            "Add RBAC for cluster and pipeline access",
        ],
        (Security, Solid) => &[
            "Add secret scanning and dependency review to every pull request",
            "Threat-model your deployment pipeline end to end",
        ],

        (Observability, Unknown) => &[
            "Add structured logging to one service",
            "Learn the difference between logs, metrics and traces",
        ],
        (Observability, Beginner) => &[
            "Set up CloudWatch alarms and structured logging for a service",
            "Build a dashboard for request rate, errors and latency",
        ],
        (Observability, Developing) => &[
            "Export metrics to Prometheus and visualise them in Grafana",
            "Define alerting rules with clear runbooks",
        ],
        (Observability, Solid) => &[
            "Add distributed tracing across service boundaries",
            "Define SLOs and alert on error budget burn",
        ],

        (Testing, Unknown) => &[
            "Write unit tests for one module with pytest or jest",
            "Run the test suite locally before every commit",
        ],
        (Testing, Beginner) => &[
            "Run tests in CI and publish coverage reports",
            "Add tests for the failure paths, not only the happy path",
        ],
        (Testing, Developing) => &[
            "Write integration tests with pytest and achieve 80%+ coverage",
            "Use containers to run integration dependencies in CI",
        ],
        (Testing, Solid) => &[
            "Add end-to-end tests against a deployed preview environment",
            "Track flaky tests and quarantine them automatically",
        ],

        (_, Advanced) => &[],
    }
}
